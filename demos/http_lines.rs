//! HTTP lines - send a request and print the response line by line.
//!
//! This demo shows:
//! - Building a request with `Packet::fill`
//! - Framing the response with a `\r\n` delimiter strategy
//! - Stripping the delimiter from each frame
//!
//! # Running
//!
//! ```text
//! RUST_LOG=packet_stream=debug cargo run --example http_lines -- example.com 80
//! ```

use packet_stream::protocol::{Strategy, StreamFramer};
use packet_stream::{Packet, PacketStream};
use tracing_subscriber::EnvFilter;

const CRLF: &[u8] = b"\r\n";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().map(|p| p.parse()).transpose()?.unwrap_or(8080);

    let framer = StreamFramer::with_strategy(Strategy::delimiter(CRLF));
    let mut stream = PacketStream::connect((host.as_str(), port), framer).await?;

    let mut request = Packet::new();
    request.fill("GET / HTTP/1.1\r\n")?;
    request.fill(format!("Host: {}\r\n", host).as_str())?;
    request.fill("Connection: close\r\n\r\n")?;
    stream.send(&request).await?;

    while let Some(line) = stream.next_frame().await? {
        let text = String::from_utf8_lossy(&line[..line.len() - CRLF.len()]);
        if text.is_empty() {
            // End of headers; the body is not line-oriented.
            break;
        }
        println!("{}", text);
    }

    Ok(())
}
