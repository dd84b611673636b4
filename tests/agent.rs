//! End-to-end tests through the `avdata` facade.

use avdata::avdata_store::codec::decode_value;
use avdata::prelude::*;
use minicbor::{Decoder, Encoder};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Link {
    responses: Mutex<Vec<Response>>,
    pushes: Mutex<Vec<Vec<u8>>>,
}

impl Uplink for Link {
    fn push(&self, payload: &[u8]) -> Result<(), PushError> {
        self.pushes.lock().push(payload.to_vec());
        Ok(())
    }
}

impl Transport for Link {
    fn respond(&self, response: Response) -> Result<(), ServiceError> {
        self.responses.lock().push(response);
        Ok(())
    }
}

/// A command handler samples a sensor into a record and the server reads
/// the sensor back; the batch is pushed once the command replies.
#[test]
fn sample_command_pushes_batch() {
    let config = ServiceConfig::from_json_str(
        r#"{ "record_buffer_bytes": 2048, "tracing": { "level": "warn", "format": "compact" } }"#,
    )
    .unwrap();
    config.tracing.to_setup().unwrap().init().unwrap();

    let store = Arc::new(AssetStore::new());
    store.create("/sensor/level", AccessMode::Variable).unwrap();
    store.create("/sensor/sample", AccessMode::Command).unwrap();

    let link = Arc::new(Link::default());
    let service = Arc::new(AssetDataService::with_config(
        Arc::clone(&store),
        link.clone(),
        config,
    ));
    let rec = service.records().create(SessionId(1));

    let recorder = Arc::clone(&service);
    store
        .add_handler("/sensor/sample", move |event: &ResourceEvent<'_>| {
            let count = event.args.get_int("count").unwrap_or(1);
            let result = recorder.records().with_record(rec, |record| {
                for i in 0..count {
                    event.store.set_int("/sensor/level", i * 10).unwrap();
                    let level = event.store.get_int("/sensor/level").unwrap();
                    record.add_int("/sensor/level", level, 1_000 + i as u64)?;
                }
                Ok::<_, TimeSeriesError>(())
            });
            recorder
                .reply_exec_result(result.and_then(|inner| inner))
                .unwrap();
        })
        .unwrap();

    let mut args = Vec::new();
    Encoder::new(&mut args)
        .map(1)
        .unwrap()
        .str("count")
        .unwrap()
        .u8(3)
        .unwrap();
    service
        .handle(
            Request::new(Method::Execute, "/sensor/sample")
                .with_payload(args)
                .with_token([42]),
        )
        .unwrap();

    service
        .handle(Request::new(Method::Read, "/sensor/level"))
        .unwrap();

    {
        let responses = link.responses.lock();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].code, ResponseCode::Changed);
        assert_eq!(responses[0].token, [42]);
        assert_eq!(responses[1].code, ResponseCode::Content);
        assert_eq!(
            decode_value(&mut Decoder::new(&responses[1].payload)).unwrap(),
            Value::Int(20)
        );
    }

    service.push_record(rec).unwrap();
    let pushes = link.pushes.lock();
    assert_eq!(pushes.len(), 1);
    let raw = zstd::decode_all(pushes[0].as_slice()).unwrap();
    let mut dec = Decoder::new(&raw);
    assert_eq!(dec.map().unwrap(), Some(3));
    assert_eq!(dec.str().unwrap(), "h");
    assert_eq!(dec.array().unwrap(), Some(1));
    assert_eq!(dec.str().unwrap(), "/sensor/level");
    assert!(
        service
            .records()
            .with_record(rec, |record| record.is_empty())
            .unwrap()
    );
}
