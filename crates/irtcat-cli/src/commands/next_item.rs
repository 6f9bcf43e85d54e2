//! The `irtcat next-item` command.

use std::path::PathBuf;

use anyhow::Result;

use irtcat_core::service::{next_item, NextItemRequest, NextItemResponse};

use super::{fill_items, print_json, read_request};

pub fn execute(input: PathBuf, bank: Option<PathBuf>) -> Result<()> {
    let mut request: NextItemRequest = read_request(&input)?;
    fill_items(bank, &mut request.items)?;
    let response = next_item(&request);
    if let NextItemResponse::NoItemAvailable = response {
        tracing::info!(
            candidates = request.items.len(),
            answered = request.history.len(),
            "no eligible item left"
        );
    }
    print_json(&response)
}
