use std::sync::Arc;

use bytes::Bytes;

use buildd_core::output::{
    reply_channel, BuildEventSink, OutboundEvent, OutputMultiplexer, ProgressEvent, StreamTag,
};

const PER_PRODUCER: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_their_own_order() {
    let (tx, mut rx) = reply_channel(8);
    let mux = Arc::new(OutputMultiplexer::new("op", tx));

    let mut producers = Vec::new();
    for producer in 0..3usize {
        let mux = mux.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..PER_PRODUCER {
                let text = format!("{producer}:{i}");
                match producer {
                    0 => mux.on_progress(ProgressEvent::new(text)).await,
                    1 => mux.on_standard_output(Bytes::from(text)).await,
                    _ => mux.on_standard_error(Bytes::from(text)).await,
                }
            }
        }));
    }

    let reader = tokio::spawn(async move {
        let mut seen: Vec<Vec<usize>> = vec![Vec::new(); 3];
        while let Some(ev) = rx.recv().await {
            let text = match ev {
                OutboundEvent::Progress { message } => message,
                OutboundEvent::Output { stream, bytes } => {
                    let text = String::from_utf8(bytes.to_vec()).unwrap();
                    let expected = if text.starts_with("1:") {
                        StreamTag::Stdout
                    } else {
                        StreamTag::Stderr
                    };
                    assert_eq!(stream, expected);
                    text
                }
                OutboundEvent::Result(_) => continue,
            };
            let (producer, i) = text.split_once(':').unwrap();
            seen[producer.parse::<usize>().unwrap()].push(i.parse().unwrap());
        }
        seen
    });

    for p in producers {
        p.await.unwrap();
    }
    drop(mux);

    let seen = reader.await.unwrap();
    let expected: Vec<usize> = (0..PER_PRODUCER).collect();
    for per_producer in seen {
        assert_eq!(per_producer, expected);
    }
}
