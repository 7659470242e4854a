use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use clap::Parser;
use serde_json::{json, Value};
use triad_mvp::adapters::xmlrpc::{encode_fault, encode_response, parse_method_call, MethodCall};
use triad_mvp::utils::logger;

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// 開發用的 XML-RPC 接收端，印出收到的 payload
#[derive(Debug, Parser)]
#[command(name = "rpc_receiver")]
#[command(about = "Development XML-RPC receiver for the send panel")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:7777")]
    bind: String,

    #[arg(long, short, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let app = Router::new().route("/RPC2", post(rpc2));
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;

    tracing::info!("XML-RPC receiver listening on http://{}/RPC2", args.bind);
    tracing::info!("Method: receive(payload: struct) -> string");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn rpc2(body: String) -> impl IntoResponse {
    let reply = match parse_method_call(&body) {
        Ok(call) => dispatch(call),
        Err(e) => {
            tracing::warn!("Unparseable request: {}", e);
            encode_fault(PARSE_ERROR, &format!("parse error: {}", e))
        }
    };
    match reply {
        Ok(xml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], xml),
        Err(e) => {
            tracing::error!("Failed to encode reply: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
        }
    }
}

fn dispatch(call: MethodCall) -> triad_mvp::Result<String> {
    match call.method.as_str() {
        "receive" => match call.params.as_slice() {
            [Value::Object(payload)] => {
                tracing::info!(
                    "=== XML-RPC payload received at {} ===",
                    chrono::Local::now().to_rfc3339()
                );
                tracing::info!("{}", serde_json::to_string_pretty(payload).unwrap_or_default());
                encode_response(&Value::String(receipt(payload)))
            }
            _ => encode_fault(INVALID_PARAMS, "receive expects exactly one struct"),
        },
        "system.listMethods" => encode_response(&json!(["receive", "system.listMethods"])),
        other => {
            tracing::warn!("Unknown method {:?}", other);
            encode_fault(
                METHOD_NOT_FOUND,
                &format!("method \"{}\" is not supported", other),
            )
        }
    }
}

fn receipt(payload: &serde_json::Map<String, Value>) -> String {
    let text = |key: &str, default: &str| match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    };
    format!(
        "Server received: identifier={}, amount={} {}",
        text("identifier", "<unknown>"),
        text("amount", "0"),
        text("currency", "")
    )
    .trim()
    .to_string()
}
