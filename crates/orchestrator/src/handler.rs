//! Lifecycle entry point: dispatches a create/update/delete request to the
//! sequencer and the reaper, and shapes the response.

use std::collections::BTreeMap;

use chaincode_types::{DeploymentPlan, LifecycleResponse, RequestType};

use crate::{error::Result, reaper::reap_stale, resolve::Results, sequencer::Sequencer};

/// Run one lifecycle event against the plan.
///
/// `Create` deploys idempotently. `Update` deploys, then reaps persisted
/// records for contracts dropped from the plan. `Delete` only reaps, with
/// nothing kept.
pub async fn handle(
    request: RequestType,
    plan: &DeploymentPlan,
    sequencer: &Sequencer<'_>,
) -> Result<LifecycleResponse> {
    let physical_id = sequencer.keys.physical_id();

    match request {
        RequestType::Create => {
            let results = sequencer.run(plan).await?;
            Ok(LifecycleResponse::success(physical_id, addr_data(&results)))
        }
        RequestType::Update => {
            let results = sequencer.run(plan).await?;
            reap_stale(sequencer.store, sequencer.keys, plan.names()).await?;
            Ok(LifecycleResponse::success(physical_id, addr_data(&results)))
        }
        RequestType::Delete => {
            reap_stale(sequencer.store, sequencer.keys, []).await?;
            Ok(LifecycleResponse::success(physical_id, BTreeMap::new()))
        }
    }
}

fn addr_data(results: &Results) -> BTreeMap<String, String> {
    results
        .values()
        .map(|c| {
            (
                format!("{}Addr", title_case(&c.name)),
                format!("{:#x}", c.address),
            )
        })
        .collect()
}

/// Title-case a contract name for the response data key: the first letter of
/// every alphabetic run is uppercased, the rest lowercased.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_like_the_response_contract_expects() {
        assert_eq!(title_case("membership"), "Membership");
        assert_eq!(title_case("myToken"), "Mytoken");
        assert_eq!(title_case("voting-sc"), "Voting-Sc");
        assert_eq!(title_case("erc20"), "Erc20");
    }
}
