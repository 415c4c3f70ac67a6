use std::sync::Arc;

use anyhow::Result;

use signalboard::feed::{SourceKind, StatusSource};
use signalboard::ingest::SampleIngestor;
use signalboard::logging::{json_log, obj, v_str};
use signalboard::monitor::Monitor;
use signalboard::render::build_renderer;
use signalboard::state::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let kind = SourceKind::from_config(&cfg);
    let source = kind.build(&cfg)?;
    json_log(
        "source",
        obj(&[
            ("type", v_str(source.name())),
            (
                "url",
                cfg.status_url.as_deref().map(v_str).unwrap_or(serde_json::Value::Null),
            ),
        ]),
    );

    let (ingestor, mut outcomes) = SampleIngestor::new(Arc::from(source));
    let mut renderer = build_renderer(cfg.renderer);
    let mut monitor = Monitor::from_config(cfg);

    tokio::select! {
        res = monitor.run(&ingestor, &mut outcomes, renderer.as_mut()) => res?,
        _ = tokio::signal::ctrl_c() => {
            json_log("shutdown", obj(&[("reason", v_str("ctrl_c"))]));
        }
    }
    Ok(())
}
