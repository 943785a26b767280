//! End-to-end flows against a local mock server: real HTTP transport, real
//! parsing, everything except the headless browser.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gleaner::{export, scrape_auto_next, scrape_pages, Config, FetchPool, Provenance, Session};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body.to_string())
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_parses_and_extracts() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/stats",
        r#"<html><body>
            <h1> Page  Title </h1>
            <a href="/detail/1">one</a>
            <a href="/detail/1">dupe</a>
            <img src="/logo.png">
            <table class="wikitable">
                <tr><th colspan="2">season</th></tr>
                <tr><td rowspan="2">2024</td><td>spring</td></tr>
                <tr><td>autumn</td></tr>
            </table>
        </body></html>"#,
    )
    .await;

    let mut session = Session::new(Config::default()).unwrap();
    let result = session
        .fetch(Some(&format!("{}/stats", server.uri())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(result.provenance, Provenance::Plain);

    assert_eq!(session.get_text("h1").unwrap(), "Page Title");
    assert_eq!(
        session.get_links(),
        vec![format!("{}/detail/1", server.uri())]
    );
    assert_eq!(
        session.get_images(),
        vec![format!("{}/logo.png", server.uri())]
    );

    let matrix = session.get_table(None).unwrap().unwrap();
    assert_eq!(matrix[0], vec!["season", "season"]);
    assert_eq!(matrix[1], vec!["2024", "spring"]);
    assert_eq!(matrix[2], vec!["2024", "autumn"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn custom_headers_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("x-api-key", "sekrit"))
        .and(header("user-agent", "gleaner-tests/1"))
        .respond_with(html("<p>allowed</p>"))
        .mount(&server)
        .await;

    let config = Config {
        headers: vec![
            ("X-Api-Key".into(), "sekrit".into()),
            // Case-insensitive override of the default User-Agent.
            ("user-agent".into(), "gleaner-tests/1".into()),
        ],
        ..Config::default()
    };
    let mut session = Session::new(config).unwrap();
    let result = session
        .fetch(Some(&format!("{}/private", server.uri())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.body, "<p>allowed</p>");
}

#[tokio::test]
async fn redirects_record_the_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    serve(&server, "/new", "<p>moved here</p>").await;

    let mut session = Session::new(Config::default()).unwrap();
    let result = session
        .fetch(Some(&format!("{}/old", server.uri())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.final_url, format!("{}/new", server.uri()));
    assert_eq!(result.body, "<p>moved here</p>");
}

#[tokio::test]
async fn strict_mode_turns_404_into_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = Config {
        strict: true,
        ..Config::default()
    };
    let mut session = Session::new(config).unwrap();
    let err = session
        .fetch(Some(&format!("{}/gone", server.uri())))
        .await
        .unwrap_err();
    assert!(matches!(err, gleaner::Error::Status { status: 404, .. }));
}

#[tokio::test]
async fn pattern_pagination_collects_across_pages() {
    let server = MockServer::start().await;
    serve(&server, "/list/1", "<li class='row'>a</li><li class='row'>b</li>").await;
    serve(&server, "/list/2", "<li class='row'>c</li>").await;

    let mut session = Session::new(Config::default()).unwrap();
    let texts = scrape_pages(
        &mut session,
        &format!("{}/list/{{}}", server.uri()),
        2,
        "li.row",
    )
    .await
    .unwrap();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn auto_next_follows_relative_links_until_the_chain_ends() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/p1",
        r#"<h2>one</h2><a rel="next" href="/p2">more</a>"#,
    )
    .await;
    serve(&server, "/p2", r#"<h2>two</h2><li class="next"><a href="p3">more</a></li>"#).await;
    serve(&server, "/p3", "<h2>three</h2>").await;

    let mut session = Session::new(Config::default()).unwrap();
    let texts = scrape_auto_next(&mut session, &format!("{}/p1", server.uri()), "h2", 10)
        .await
        .unwrap();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn form_submission_and_json_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("q=rust+tables"))
        .respond_with(html("<p>2 results</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count": 7}"#))
        .mount(&server)
        .await;

    let mut session = Session::new(Config::default()).unwrap();

    let fields = vec![("q".to_string(), "rust tables".to_string())];
    let result = session
        .submit_form(&format!("{}/search", server.uri()), &fields)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.body, "<p>2 results</p>");

    let value = session
        .fetch_json(Some(&format!("{}/api?page=1", server.uri())))
        .await
        .unwrap();
    assert_eq!(value["count"], 7);
}

#[tokio::test]
async fn download_streams_bytes_to_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("downloads/file.bin");
    let session = Session::new(Config::default()).unwrap();

    let bytes = gleaner::download_file(&session, &format!("{}/file.bin", server.uri()), &dest)
        .await
        .unwrap();
    assert_eq!(bytes, 4096);
    assert_eq!(std::fs::metadata(&dest).unwrap().len(), 4096);
}

#[tokio::test]
async fn pool_preserves_input_order_and_isolates_failures() {
    let server = MockServer::start().await;
    serve(&server, "/a", "<p>a</p>").await;
    serve(&server, "/c", "<p>c</p>").await;
    Mock::given(method("GET"))
        .and(path("/b"))
        // Soft block with no browser available: the worker reports failure.
        .respond_with(ResponseTemplate::new(200).set_body_string("verify you are human"))
        .mount(&server)
        .await;

    // Point browser discovery at nothing so fallback fails fast.
    std::env::set_var("GLEANER_CHROMIUM_PATH", "/nonexistent/chromium");

    let urls: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|p| format!("{}/{p}", server.uri()))
        .collect();
    let pool = FetchPool::new(Config::default()).unwrap();
    let results = pool.fetch_all(&urls, 3).await.unwrap();

    let order: Vec<_> = results.iter().map(|(u, _)| u.clone()).collect();
    assert_eq!(order, urls);
    let oks: Vec<_> = results.iter().map(|(_, ok)| *ok).collect();
    assert_eq!(oks[0], true);
    assert_eq!(oks[2], true);
}

#[tokio::test]
async fn rate_limit_spaces_sequential_fetches() {
    let server = MockServer::start().await;
    serve(&server, "/t", "<p>tick</p>").await;

    let config = Config {
        delay: Duration::from_millis(200),
        ..Config::default()
    };
    let mut session = Session::new(config).unwrap();
    let url = format!("{}/t", server.uri());

    let start = std::time::Instant::now();
    for _ in 0..3 {
        session.fetch(Some(&url)).await.unwrap().unwrap();
    }
    // Three fetches, so at least two full delay windows must have passed.
    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn extracted_table_exports_to_csv() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/data",
        r#"<table class="wikitable">
            <tr><th>name</th><th>qty</th></tr>
            <tr><td>bolts</td><td>41</td></tr>
        </table>"#,
    )
    .await;

    let mut session = Session::new(Config::default()).unwrap();
    session
        .fetch(Some(&format!("{}/data", server.uri())))
        .await
        .unwrap()
        .unwrap();
    let matrix = session.get_table(None).unwrap().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    export::save_csv(&matrix, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.trim(), "name,qty\nbolts,41");
}
