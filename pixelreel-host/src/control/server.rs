//! TCP control server
//!
//! One connection is served at a time. Every complete request frame gets
//! exactly one reply frame; a corrupt frame gets a `Malformed` error.

use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, info, warn};
use pixelreel_core::traits::{KeyValueStore, Storage};
use pixelreel_protocol::{ControlReply, ErrorCode, FrameParser};

use super::handler::ControlHandler;

fn write_reply<W: Write>(stream: &mut W, reply: &ControlReply) -> io::Result<()> {
    let frame = reply.to_frame().or_else(|e| {
        warn!("Cannot encode reply {:?}: {:?}", reply, e);
        ControlReply::Error(ErrorCode::Malformed).to_frame()
    });
    let bytes = frame
        .and_then(|f| f.encode_to_vec())
        .map_err(|e| io::Error::new(ErrorKind::InvalidData, format!("{:?}", e)))?;
    stream.write_all(&bytes)?;
    stream.flush()
}

/// Serve requests from one stream until it closes
///
/// A partial upload does not survive the connection.
pub fn serve_connection<T, M, K, S>(
    stream: &mut T,
    handler: &mut ControlHandler<'_, M, K, S>,
) -> io::Result<()>
where
    T: Read + Write,
    M: RawMutex,
    K: KeyValueStore,
    S: Storage,
{
    let mut parser = FrameParser::new();
    let mut buf = [0u8; 512];

    let result = loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => break Err(e),
        };

        let mut written = Ok(());
        for &byte in &buf[..n] {
            let reply = match parser.feed(byte) {
                Ok(Some(frame)) => handler.handle_frame(&frame),
                Ok(None) => continue,
                Err(e) => {
                    debug!("Frame error: {:?}", e);
                    ControlReply::Error(ErrorCode::Malformed)
                }
            };
            written = write_reply(stream, &reply);
            if written.is_err() {
                break;
            }
        }
        if let Err(e) = written {
            break Err(e);
        }
    };

    handler.abort_upload();
    result
}

/// Accept connections on a dedicated thread
pub fn spawn_control_server<M, K, S>(
    listener: TcpListener,
    mut handler: ControlHandler<'static, M, K, S>,
) -> io::Result<JoinHandle<()>>
where
    M: RawMutex + Sync + 'static,
    K: KeyValueStore + Send + 'static,
    S: Storage + Send + 'static,
    ControlHandler<'static, M, K, S>: Send,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Control server listening on {}", addr);
    }

    thread::Builder::new()
        .name(String::from("control"))
        .spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(mut stream) => {
                        let peer = stream.peer_addr().ok();
                        debug!("Controller connected: {:?}", peer);
                        if let Err(e) = serve_connection(&mut stream, &mut handler) {
                            warn!("Control connection failed: {}", e);
                        }
                        debug!("Controller disconnected: {:?}", peer);
                    }
                    Err(e) => warn!("Accept failed: {}", e),
                }
            }
        })
}
