//! A one-repository smart-HTTP fixture server
//!
//! Serves canned bodies for the two endpoints of the upload-pack
//! conversation over real sockets, so clone tests exercise the full HTTP
//! client path. The accept loop runs on a detached thread and dies with the
//! test process.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

pub struct FixtureRemote {
    info_refs: Vec<u8>,
    upload_pack: Vec<u8>,
}

/// Start serving and return the remote URL to clone from
pub fn serve(info_refs: Vec<u8>, upload_pack: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind fixture server");
    let port = listener.local_addr().expect("local addr").port();

    let remote = Arc::new(FixtureRemote {
        info_refs,
        upload_pack,
    });
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let remote = Arc::clone(&remote);
            thread::spawn(move || handle_connection(stream, &remote));
        }
    });

    format!("http://127.0.0.1:{}/fixture.git", port)
}

fn handle_connection(stream: TcpStream, remote: &FixtureRemote) {
    let mut reader = BufReader::new(stream.try_clone().expect("failed to clone stream"));
    let mut stream = stream;

    // Serve requests until the client closes its end (keep-alive friendly)
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
            return;
        }

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap_or(0) == 0 {
                return;
            }
            if header == "\r\n" || header == "\n" {
                break;
            }
            let header = header.to_ascii_lowercase();
            if let Some(value) = header.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }

        let mut request_body = vec![0u8; content_length];
        if reader.read_exact(&mut request_body).is_err() {
            return;
        }

        let body = if request_line.contains("/info/refs") {
            &remote.info_refs
        } else {
            &remote.upload_pack
        };
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        if stream.write_all(head.as_bytes()).is_err() || stream.write_all(body).is_err() {
            return;
        }
        let _ = stream.flush();
    }
}
