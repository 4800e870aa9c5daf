use std::net::{IpAddr, Ipv4Addr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// A port nothing listens on.
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Second loopback address, for targets that must not share ports with
/// `LOCALHOST`.
pub const LOOPBACK_2: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2));

/// Answers every connection with `response` after reading the request.
pub async fn serve_tcp(response: &'static str) -> (u16, JoinHandle<()>) {
    serve_tcp_at(LOCALHOST, response).await
}

/// [`serve_tcp`] on a chosen loopback address.
pub async fn serve_tcp_at(ip: IpAddr, response: &'static str) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind((ip, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (port, handle)
}

/// Plain HTTP/1.1 response with the given `Server` header and title.
pub fn http_response(server: &str, title: &str) -> &'static str {
    let body = format!("<html><head><title>{title}</title></head><body></body></html>");
    let response = format!(
        "HTTP/1.1 200 OK\r\nServer: {server}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    Box::leak(response.into_boxed_str())
}

/// Accepts connections and never writes a byte.
pub async fn silent_tcp() -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut held: Vec<TcpStream> = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    (port, handle)
}

/// A bound UDP socket that never answers. Dropping it closes the port.
pub async fn silent_udp() -> (u16, UdpSocket) {
    let socket = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (port, socket)
}

/// Open resolver: answers every query with one `A` record.
pub async fn dns_responder() -> (u16, JoinHandle<()>) {
    let socket = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 512];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            let reply = resolve(&buf[..len]);
            let _ = socket.send_to(&reply, peer).await;
        }
    });

    (port, handle)
}

fn resolve(query: &[u8]) -> Vec<u8> {
    let mut reply = Vec::with_capacity(query.len() + 16);
    // Same id; QR, RD, RA; one question, one answer.
    reply.extend_from_slice(&query[..2]);
    reply.extend_from_slice(&[0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    reply.extend_from_slice(&query[12..]);
    // Pointer to the question name, A, IN, TTL 60, 4 bytes of address.
    reply.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3c, 0x00, 0x04]);
    reply.extend_from_slice(&[93, 184, 216, 34]);
    reply
}
