use clap::Parser;
use serde_json::json;
use std::f64::consts::PI;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, Level};

/// Sends synthetic JSON animation datagrams: a three bone chain whose last bone turns its head
///  left and right, and a blinking parameter
#[derive(Parser)]
struct Args {
    target: String,

    #[clap(long, default_value = "Head")]
    subject: String,

    #[clap(long, default_value_t = 30)]
    fps: u32,

    /// number of frames to send, 0 for no limit
    #[clap(long, default_value_t = 0)]
    frames: u64,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,
}

fn frame(subject: &str, t: f64) -> serde_json::Value {
    let half_angle = (t * PI).sin() * PI / 8.0;
    let blink = if (t * 4.0) as u64 % 8 == 0 { 1.0 } else { 0.0 };
    json!({
        subject: {
            "Bone": [
                {"Name": "root", "Parent": -1, "Location": [0.0, 0.0, 0.0], "Rotation": [0.0, 0.0, 0.0, 1.0], "Scale": [1.0, 1.0, 1.0]},
                {"Name": "neck", "Parent": 0, "Location": [0.0, 0.0, 150.0], "Rotation": [0.0, 0.0, 0.0, 1.0], "Scale": [1.0, 1.0, 1.0]},
                {"Name": "head", "Parent": 1, "Location": [0.0, 0.0, 10.0], "Rotation": [0.0, 0.0, half_angle.sin(), half_angle.cos()], "Scale": [1.0, 1.0, 1.0]},
            ],
            "Parameter": [
                {"Name": "eyeBlinkLeft", "Value": blink},
                {"Name": "jawOpen", "Value": (t * 2.0).sin().abs()},
            ],
        }
    })
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .try_init()
        .ok();

    let target: SocketAddr = args.target.parse()?;
    let socket = UdpSocket::bind(if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" }).await?;
    if target.ip().is_multicast() && target.is_ipv4() {
        socket.set_multicast_ttl_v4(2)?;
    }

    let frame_interval = Duration::from_secs_f64(1.0 / args.fps.max(1) as f64);
    let mut interval = tokio::time::interval(frame_interval);

    info!("sending subject {:?} to {} at {} fps", args.subject, target, args.fps);
    let mut frame_number = 0u64;
    while args.frames == 0 || frame_number < args.frames {
        interval.tick().await;

        let payload = frame(&args.subject, frame_number as f64 * frame_interval.as_secs_f64()).to_string();
        socket.send_to(payload.as_bytes(), target).await?;
        debug!("sent frame {} ({} bytes)", frame_number, payload.len());

        frame_number += 1;
    }

    info!("sent {} frames", frame_number);
    Ok(())
}
