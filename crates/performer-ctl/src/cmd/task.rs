//! Task commands: validate and execute payloads through the dispatcher.

use std::io::Read;

use anyhow::{Context, Result};
use performer_core::{TaskRequest, TaskResponse};
use performer_services::TaskDispatcher;

use super::interface::decode_hex;
use super::Options;

fn request_from_hex(opts: &Options, payload: &str) -> Result<TaskRequest> {
    let payload = decode_hex(payload).context("payload")?;
    Ok(TaskRequest::new(opts.task_id.as_bytes().to_vec(), payload))
}

pub fn cmd_validate(dispatcher: &TaskDispatcher, opts: &Options, payload: &str) -> Result<()> {
    let request = request_from_hex(opts, payload)?;
    match dispatcher.validate(&request) {
        Ok(()) => {
            println!(
                "valid ({} bytes, selector {})",
                request.payload.len(),
                dispatcher.descriptor().selector()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("invalid (rejected after {:?}): {}", e.state(), e);
            std::process::exit(2);
        }
    }
}

pub fn cmd_execute(dispatcher: &TaskDispatcher, opts: &Options, payload: &str) -> Result<()> {
    let request = request_from_hex(opts, payload)?;
    let response = dispatcher.execute(&request).context("task failed")?;
    print_response(opts, &response)
}

pub fn cmd_task(dispatcher: &TaskDispatcher, opts: &Options, json: &str) -> Result<()> {
    let request: TaskRequest = serde_json::from_str(json).context("invalid TaskRequest JSON")?;
    let response = dispatcher.execute(&request).context("task failed")?;
    print_response(opts, &response)
}

pub fn cmd_task_stdin(dispatcher: &TaskDispatcher, opts: &Options) -> Result<()> {
    let mut json = String::new();
    std::io::stdin()
        .read_to_string(&mut json)
        .context("failed to read stdin")?;
    cmd_task(dispatcher, opts, &json)
}

fn print_response(opts: &Options, response: &TaskResponse) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string(response).context("failed to render response")?);
        return Ok(());
    }
    // Results are usually text (a hex digest or a JSON-RPC body).
    match std::str::from_utf8(&response.result) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("0x{}", hex::encode(&response.result)),
    }
    Ok(())
}
