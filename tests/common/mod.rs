#![allow(dead_code)]

use listening_insights::config::Config;

/// Config pointing both Spotify services at a mockito server.
pub fn mock_config(server_url: &str) -> Config {
    Config {
        client_id: "test_id".into(),
        client_secret: "test_secret".into(),
        auth_base: server_url.to_string(),
        api_base: format!("{}/v1", server_url),
        ..Config::default()
    }
}

/// `Basic base64("test_id:test_secret")`
pub const BASIC_AUTH: &str = "Basic dGVzdF9pZDp0ZXN0X3NlY3JldA==";

/// One-shot HTTP server that answers `200` announcing a 500-byte body,
/// sends a few bytes of it and hangs up. Returns the base URL.
pub fn truncated_body_server() -> String {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            // drain the request head and any body before answering
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let body_len = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + body_len {
                        break;
                    }
                }
            }
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 500\r\n\r\n{\"access",
            );
            let _ = stream.flush();
        }
    });
    format!("http://{}", addr)
}
