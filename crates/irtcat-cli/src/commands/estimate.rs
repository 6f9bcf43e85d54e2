//! The `irtcat estimate` command.

use std::path::PathBuf;

use anyhow::Result;

use irtcat_core::service::{estimate_session, EstimateRequest};

use super::{fill_items, print_json, read_request};

pub fn execute(input: PathBuf, bank: Option<PathBuf>) -> Result<()> {
    let mut request: EstimateRequest = read_request(&input)?;
    fill_items(bank, &mut request.items)?;
    print_json(&estimate_session(&request))
}
