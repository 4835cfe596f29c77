use gazette::fetcher::{DEFAULT_TIMEOUT, FetchError, HttpFetcher};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Test</title></head><body>Hello World</body></html>"
                        .as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let result = fetcher().fetch_page(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body.contains("Hello World"));
    assert_eq!(result.url_final.as_str(), url);
}

#[tokio::test]
async fn test_fetch_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let result = fetcher().fetch_page(&url).await;

    match result {
        Err(FetchError::Http { status }) => {
            assert_eq!(status.as_u16(), 404);
        }
        _ => panic!("Expected HTTP 404 error"),
    }
}

#[tokio::test]
async fn test_fetch_500_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/error", mock_server.uri());
    let err = fetcher().fetch_page(&url).await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.to_string(), "http error 500 Internal Server Error");
}

#[tokio::test]
async fn test_fetch_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redirect"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/redirect", mock_server.uri());
    let result = fetcher().fetch_page(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body.contains("Final page"));
    assert!(result.url_final.as_str().ends_with("/final"));
}

#[tokio::test]
async fn test_fetch_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original_content =
        "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";

    // Gzip the content
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original_content.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzipped", mock_server.uri());
    let result = fetcher().fetch_page(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body.contains("This content is gzipped!"));
}

#[tokio::test]
async fn test_fetch_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]) // JPEG header
                .insert_header("Content-Type", "image/jpeg"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/image", mock_server.uri());
    let result = fetcher().fetch_page(&url).await;

    match result {
        Err(FetchError::UnsupportedContentType(content_type)) => {
            assert_eq!(content_type, "image/jpeg");
        }
        _ => panic!("Expected UnsupportedContentType error"),
    }
}

#[tokio::test]
async fn test_fetch_body_too_large() {
    let mock_server = MockServer::start().await;

    // Create a large body (6MB > 5MB limit)
    let large_body = "x".repeat(6 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", &(6 * 1024 * 1024).to_string()),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/large", mock_server.uri());
    let result = fetcher().fetch_page(&url).await;

    match result {
        Err(FetchError::BodyTooLarge(size)) => {
            assert_eq!(size, 6 * 1024 * 1024);
        }
        _ => panic!("Expected BodyTooLarge error"),
    }
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let result = fetcher().fetch_page("not-a-valid-url").await;

    match result {
        Err(FetchError::InvalidUrl(_)) => {}
        _ => panic!("Expected InvalidUrl error"),
    }
}

#[tokio::test]
async fn test_fetch_document_accepts_any_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<?xml version=\"1.0\"?><rss version=\"2.0\"></rss>".as_bytes())
                .insert_header("Content-Type", "application/rss+xml"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/feed.xml", mock_server.uri());
    let result = fetcher().fetch_document(&url).await.unwrap();
    assert!(result.body.contains("<rss"));

    // The same document is refused as an article page
    let page = fetcher().fetch_page(&url).await;
    assert!(matches!(page, Err(FetchError::UnsupportedContentType(_))));
}

#[tokio::test]
async fn test_fetch_decodes_declared_charset() {
    let mock_server = MockServer::start().await;

    // "café" in ISO-8859-1
    let body = b"<html><body><p>caf\xe9</p></body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=iso-8859-1"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin1", mock_server.uri());
    let result = fetcher().fetch_page(&url).await.unwrap();

    assert!(result.body.contains("café"));
    assert_eq!(result.charset.name(), "windows-1252");
}

#[tokio::test]
async fn test_fetch_sends_browser_user_agent() {
    use wiremock::matchers::header_regex;

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header_regex("user-agent", r"^Mozilla/5\.0 .*Chrome/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>ok</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/ua", mock_server.uri());
    fetcher().fetch_page(&url).await.unwrap();
}

#[tokio::test]
async fn test_fetch_page_rejects_missing_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/untyped"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("%PDF-1.4 binary".as_bytes()))
        .mount(&mock_server)
        .await;

    let url = format!("{}/untyped", mock_server.uri());
    match fetcher().fetch_page(&url).await {
        Err(FetchError::UnsupportedContentType(content_type)) => {
            assert_eq!(content_type, "");
        }
        other => panic!("Expected UnsupportedContentType error, got {other:?}"),
    }

    // Feeds and API documents do not depend on the header
    let document = fetcher().fetch_document(&url).await.unwrap();
    assert!(document.body.contains("%PDF"));
}

#[tokio::test]
async fn test_fetch_body_too_large_without_content_length() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Body delimited by connection close, so no Content-Length is sent
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";
        let _ = socket.write_all(head.as_bytes()).await;
        let chunk = vec![b'x'; 64 * 1024];
        for _ in 0..(6 * 16) {
            if socket.write_all(&chunk).await.is_err() {
                break;
            }
        }
        let _ = socket.shutdown().await;
    });

    let url = format!("http://{addr}/stream");
    match fetcher().fetch_page(&url).await {
        Err(FetchError::BodyTooLarge(size)) => {
            assert!(size > 5 * 1024 * 1024);
            assert!(size < 6 * 1024 * 1024);
        }
        other => panic!("Expected BodyTooLarge error, got {other:?}"),
    }
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(DEFAULT_TIMEOUT).unwrap()
}
