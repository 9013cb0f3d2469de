mod support;

#[tokio::test]
async fn when_root_is_requested_then_index_page_is_served() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.text().await.expect("body should be text");
    assert!(body.contains("/ws?role=player"));
}

#[tokio::test]
async fn when_sprite_is_requested_then_it_is_served_as_png() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/static/player.png"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(res.headers()[reqwest::header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn when_file_is_missing_then_json_error_is_returned() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/static/nope.txt"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let payload: serde_json::Value = res.json().await.expect("body should be json");
    assert_eq!(payload["error"], "file not found");
}
