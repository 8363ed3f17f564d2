use night_emitter::{args, EventEmitter, Listener};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

fn main() {
    env_logger::init();

    let emitter = EventEmitter::new();
    let (done_tx, done_rx) = mpsc::channel();
    let done_tx = Mutex::new(done_tx);

    emitter.on(
        "hello",
        Listener::new(move |args| {
            let name = args.get::<&str>(0).copied().unwrap_or("stranger");
            println!("hello {}", name);
            if let Ok(tx) = done_tx.lock() {
                let _ = tx.send(());
            }
        }),
    );

    if emitter.emit("hello", args!["night-emitter"]) {
        // emit does not wait for listeners; wait here so the line gets printed
        let _ = done_rx.recv_timeout(Duration::from_secs(1));
    }
}
