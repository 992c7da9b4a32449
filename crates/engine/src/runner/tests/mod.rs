
use std::time::Duration;

use gecko_api::RpcError;
use gecko_types::StakingRole;
use serde_json::json;

use self::support::{PENDING, START, ScriptedNode, runner, runner_with, start_clock, test_config};
use crate::{Clock, WaitTarget, WorkflowError, is_pending_import_error};

fn account(nonce: &str, balance: &str) -> serde_json::Value {
    json!({"address": "P-staker", "nonce": nonce, "balance": balance})
}

#[test]
fn payer_nonce_is_read_fresh_for_every_call() {
    let node = ScriptedNode::new();
    node.reply("platform.getAccount", account("4", "0"))
        .reply("platform.getAccount", account("9", "0"));
    let runner = runner(&node, &start_clock());

    assert_eq!(runner.next_payer_nonce("P-staker").unwrap(), 5);
    assert_eq!(runner.current_payer_nonce("P-staker").unwrap(), 9);
    assert_eq!(node.calls_to("platform.getAccount").len(), 2);
    assert_eq!(node.endpoint_of("platform.getAccount").as_deref(), Some("ext/P"));
}

#[test]
fn non_numeric_nonce_is_reported() {
    let node = ScriptedNode::new();
    node.reply("platform.getAccount", account("four", "0"));
    let runner = runner(&node, &start_clock());

    let error = runner.next_payer_nonce("P-staker").unwrap_err();
    assert!(matches!(error, WorkflowError::InvalidNonce { ref raw, .. } if raw == "four"));
}

#[test]
fn exhausted_nonce_is_an_error_instead_of_wrapping() {
    let node = ScriptedNode::new();
    node.reply("platform.getAccount", account(&u64::MAX.to_string(), "0"));
    let runner = runner(&node, &start_clock());

    let error = runner.next_payer_nonce("P-staker").unwrap_err();
    assert!(matches!(error, WorkflowError::NonceOverflow { ref address } if address == "P-staker"));
}

#[test]
fn xchain_balance_parses_decimal_strings() {
    let node = ScriptedNode::new();
    node.reply("avm.getBalance", json!({"balance": "1500"}))
        .reply("avm.getBalance", json!({"balance": "lots"}));
    let runner = runner(&node, &start_clock());

    assert_eq!(runner.xchain_balance("X-abc").unwrap(), 1500);
    assert_eq!(node.calls_to("avm.getBalance")[0]["assetID"], "AVA");
    assert!(matches!(runner.xchain_balance("X-abc"), Err(WorkflowError::InvalidBalance { .. })));
}

#[test]
fn transaction_acceptance_polls_until_accepted() {
    let node = ScriptedNode::new();
    node.reply("avm.getTxStatus", json!({"status": "Processing"}))
        .reply("avm.getTxStatus", json!({"status": "Processing"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}));
    let clock = start_clock();
    let runner = runner(&node, &clock);

    runner.wait_for_xchain_transaction_acceptance("tx-1").unwrap();
    assert_eq!(node.calls_to("avm.getTxStatus").len(), 3);
    assert_eq!(node.calls_to("avm.getTxStatus")[0]["txID"], "tx-1");
    assert_eq!(clock.total_slept(), Duration::from_secs(2));
}

#[test]
fn transaction_acceptance_times_out_with_last_status() {
    let node = ScriptedNode::new();
    node.reply_always("avm.getTxStatus", json!({"status": "Processing"}));
    let clock = start_clock();
    let runner = runner(&node, &clock);

    let error = runner.wait_for_xchain_transaction_acceptance("tx-1").unwrap_err();
    match error {
        WorkflowError::Timeout { target, last_observed, .. } => {
            assert_eq!(target, WaitTarget::Transaction { tx_id: "tx-1".into() });
            assert_eq!(last_observed, "Processing");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(clock.total_slept() >= Duration::from_secs(10));
}

#[test]
fn status_query_failure_is_not_retried() {
    let node = ScriptedNode::new();
    node.fail("avm.getTxStatus", "couldn't find tx");
    let clock = start_clock();
    let runner = runner(&node, &clock);

    let error = runner.wait_for_xchain_transaction_acceptance("tx-1").unwrap_err();
    assert!(!error.is_timeout());
    assert_eq!(error.rpc_source().and_then(RpcError::remote_message), Some("couldn't find tx"));
    assert_eq!(clock.total_slept(), Duration::ZERO);
}

#[test]
fn seeding_tolerates_existing_users_and_funds_a_fresh_address() {
    let node = ScriptedNode::new();
    node.fail("keystore.createUser", "user already exists")
        .fail("keystore.createUser", "user already exists")
        .reply("avm.importKey", json!({"address": "X-genesis"}))
        .reply("avm.createAddress", json!({"address": "X-fresh"}))
        .reply("avm.send", json!({"txID": "seed-tx"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}));
    let runner = runner(&node, &start_clock());

    let address = runner.create_and_seed_xchain_account_from_genesis(5_000).unwrap();
    assert_eq!(address, "X-fresh");
    assert_eq!(
        node.methods(),
        [
            "keystore.createUser",
            "keystore.createUser",
            "avm.importKey",
            "avm.createAddress",
            "avm.send",
            "avm.getTxStatus",
        ]
    );

    let users = node.calls_to("keystore.createUser");
    assert_eq!(users[0]["username"], "alice");
    assert_eq!(users[1]["username"], "genesis");
    assert_eq!(node.calls_to("avm.importKey")[0]["username"], "genesis");
    assert_eq!(node.calls_to("avm.createAddress")[0]["username"], "alice");

    let send = &node.calls_to("avm.send")[0];
    assert_eq!(send["amount"], "5000");
    assert_eq!(send["assetID"], "AVA");
    assert_eq!(send["to"], "X-fresh");
    assert_eq!(send["username"], "genesis");
}

#[test]
fn xchain_to_pchain_imports_with_next_nonce_and_waits_for_balance() {
    let node = ScriptedNode::new();
    node.reply("platform.createAccount", json!({"address": "P-staker"}))
        .reply("avm.exportAVA", json!({"txID": "export-tx"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}))
        .reply("platform.getAccount", account("3", "0"))
        .reply("platform.importAVA", json!({"tx": "signed-import"}))
        .reply("platform.issueTx", json!({"txID": "import-tx"}))
        .reply("platform.getAccount", account("4", "0"))
        .reply("platform.getAccount", account("4", "5000"));
    let clock = start_clock();
    let runner = runner(&node, &clock);

    let address = runner.transfer_ava_xchain_to_pchain(5_000).unwrap();
    assert_eq!(address, "P-staker");

    let export = &node.calls_to("avm.exportAVA")[0];
    assert_eq!(export["to"], "P-staker");
    assert_eq!(export["amount"], "5000");
    let import = &node.calls_to("platform.importAVA")[0];
    assert_eq!(import["to"], "P-staker");
    assert_eq!(import["payerNonce"], "4");
    assert_eq!(node.calls_to("platform.issueTx")[0]["tx"], "signed-import");
    assert_eq!(node.calls_to("platform.getAccount").len(), 3);
    assert_eq!(clock.total_slept(), Duration::from_secs(1));
}

#[test]
fn xchain_to_pchain_fails_when_balance_never_arrives() {
    let node = ScriptedNode::new();
    node.reply("platform.createAccount", json!({"address": "P-staker"}))
        .reply("avm.exportAVA", json!({"txID": "export-tx"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}))
        .reply("platform.importAVA", json!({"tx": "signed-import"}))
        .reply("platform.issueTx", json!({"txID": "import-tx"}))
        .reply_always("platform.getAccount", account("0", "0"));
    let runner = runner(&node, &start_clock());

    let error = runner.transfer_ava_xchain_to_pchain(5_000).unwrap_err();
    assert!(matches!(
        error,
        WorkflowError::Timeout { target: WaitTarget::Balance { ref address }, .. } if address == "P-staker"
    ));
}

fn script_pchain_export(node: &ScriptedNode) {
    node.reply("platform.getAccount", account("2", "9000"))
        .reply("platform.exportAVA", json!({"unsignedTx": "unsigned-export"}))
        .reply("platform.sign", json!({"tx": "signed-export"}))
        .reply("platform.issueTx", json!({"txID": "export-tx"}));
}

#[test]
fn pchain_to_xchain_strips_prefix_for_export_and_retries_pending_import() {
    let node = ScriptedNode::new();
    script_pchain_export(&node);
    node.fail("avm.importAVA", PENDING)
        .fail("avm.importAVA", &format!("{PENDING} for X-abc"))
        .reply("avm.importAVA", json!({"txID": "import-tx"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}));
    let clock = start_clock();
    let runner = runner(&node, &clock);

    let address = runner.transfer_ava_pchain_to_xchain("P-staker", "abc", 1_000).unwrap();
    assert_eq!(address, "X-abc");

    let export = &node.calls_to("platform.exportAVA")[0];
    assert_eq!(export["to"], "abc");
    assert_eq!(export["payerNonce"], "3");
    assert_eq!(export["amount"], "1000");
    let sign = &node.calls_to("platform.sign")[0];
    assert_eq!(sign["tx"], "unsigned-export");
    assert_eq!(sign["address"], "P-staker");

    let imports = node.calls_to("avm.importAVA");
    assert_eq!(imports.len(), 3);
    assert!(imports.iter().all(|params| params["to"] == "X-abc"));
    assert_eq!(node.calls_to("avm.getTxStatus")[0]["txID"], "import-tx");
    assert_eq!(clock.total_slept(), Duration::from_secs(2));
}

#[test]
fn pchain_to_xchain_keeps_an_existing_prefix() {
    let node = ScriptedNode::new();
    script_pchain_export(&node);
    node.reply("avm.importAVA", json!({"txID": "import-tx"}))
        .reply("avm.getTxStatus", json!({"status": "Accepted"}));
    let runner = runner(&node, &start_clock());

    assert_eq!(runner.transfer_ava_pchain_to_xchain("P-staker", "X-abc", 1_000).unwrap(), "X-abc");
    assert_eq!(node.calls_to("platform.exportAVA")[0]["to"], "abc");
    assert_eq!(node.calls_to("avm.importAVA")[0]["to"], "X-abc");
}

#[test]
fn pchain_to_xchain_stops_on_any_other_import_error() {
    let node = ScriptedNode::new();
    script_pchain_export(&node);
    node.fail("avm.importAVA", PENDING).fail("avm.importAVA", "insufficient funds");
    let runner = runner(&node, &start_clock());

    let error = runner.transfer_ava_pchain_to_xchain("P-staker", "X-abc", 1_000).unwrap_err();
    assert_eq!(error.rpc_source().and_then(RpcError::remote_message), Some("insufficient funds"));
    assert_eq!(node.calls_to("avm.importAVA").len(), 2);
    assert!(node.calls_to("avm.getTxStatus").is_empty());
}

#[test]
fn pchain_to_xchain_honours_a_retry_limit() {
    let node = ScriptedNode::new();
    script_pchain_export(&node);
    for _ in 0..3 {
        node.fail("avm.importAVA", PENDING);
    }
    let mut config = test_config();
    config.import_retry_limit = Some(3);
    let clock = start_clock();
    let runner = runner_with(&node, &clock, config);

    let error = runner.transfer_ava_pchain_to_xchain("P-staker", "X-abc", 1_000).unwrap_err();
    assert!(matches!(error, WorkflowError::ImportRetriesExhausted { attempts: 3, .. }));
    assert_eq!(node.calls_to("avm.importAVA").len(), 3);
    assert_eq!(clock.total_slept(), Duration::from_secs(2));
}

#[test]
fn pending_import_detection_only_matches_remote_errors() {
    assert!(is_pending_import_error(&RpcError::remote("avm.importAVA", -32000, PENDING), PENDING));
    assert!(!is_pending_import_error(&RpcError::remote("avm.importAVA", -32000, "insufficient funds"), PENDING));
    assert!(!is_pending_import_error(&RpcError::decode("avm.importAVA", PENDING), PENDING));
}

#[test]
fn delegator_waits_for_the_window_to_open_without_polling_validators() {
    let node = ScriptedNode::new();
    node.reply("platform.getAccount", account("7", "9000"))
        .reply("platform.addDefaultSubnetDelegator", json!({"unsignedTx": "unsigned-delegation"}))
        .reply("platform.sign", json!({"tx": "signed-delegation"}))
        .reply("platform.issueTx", json!({"txID": "delegation-tx"}));
    let clock = start_clock();
    let runner = runner(&node, &clock);

    runner.add_delegator_on_subnet("NodeA", "P-staker", 2_000).unwrap();

    let delegation = &node.calls_to("platform.addDefaultSubnetDelegator")[0];
    assert_eq!(delegation["id"], "NodeA");
    assert_eq!(delegation["startTime"], (START + 20).to_string());
    assert_eq!(delegation["endTime"], (START + 72 * 60 * 60).to_string());
    assert_eq!(delegation["stakeAmount"], "2000");
    assert_eq!(delegation["payerNonce"], "8");
    assert_eq!(delegation["destination"], "P-staker");
    assert!(!delegation.contains_key("delegationFeeRate"));
    assert_eq!(node.calls_to("platform.issueTx")[0]["tx"], "signed-delegation");

    assert!(clock.now().timestamp() >= START + 20);
    assert!(node.calls_to("platform.getCurrentValidators").is_empty());
}

#[test]
fn staking_window_spans_the_configured_delays() {
    let node = ScriptedNode::new();
    let runner = runner(&node, &start_clock());

    let validator = runner.staking_descriptor(StakingRole::Validator, "NodeA", "P-staker", 10_000, 1);
    assert_eq!(validator.start_time, START + 20);
    assert_eq!(validator.duration_secs(), 72 * 60 * 60 - 20);
    assert_eq!(validator.delegation_fee_rate, Some(500_000));

    let delegator = runner.staking_descriptor(StakingRole::Delegator, "NodeA", "P-staker", 2_000, 1);
    assert_eq!(delegator.duration_secs(), validator.duration_secs());
    assert_eq!(delegator.delegation_fee_rate, None);
}

#[test]
fn validator_is_registered_with_fee_rate_and_awaited() {
    let node = ScriptedNode::new();
    node.reply("platform.getAccount", account("0", "9000"))
        .reply("platform.addDefaultSubnetValidator", json!({"unsignedTx": "unsigned-validator"}))
        .reply("platform.sign", json!({"tx": "signed-validator"}))
        .reply("platform.issueTx", json!({"txID": "validator-tx"}))
        .reply("platform.getCurrentValidators", json!({"validators": []}))
        .reply(
            "platform.getCurrentValidators",
            json!({"validators": [{"startTime": "1", "endTime": "2", "id": "NodeA"}]}),
        );
    let clock = start_clock();
    let runner = runner(&node, &clock);

    runner.add_validator_on_subnet("NodeA", "P-staker", 10_000).unwrap();

    let validator = &node.calls_to("platform.addDefaultSubnetValidator")[0];
    assert_eq!(validator["delegationFeeRate"], "500000");
    assert_eq!(validator["payerNonce"], "1");
    assert_eq!(validator["startTime"], (START + 20).to_string());
    assert_eq!(node.calls_to("platform.getCurrentValidators").len(), 2);
    assert!(node.calls_to("platform.getCurrentValidators")[0].is_empty());
    assert_eq!(clock.total_slept(), Duration::from_secs(21));
}

#[test]
fn validator_addition_timeout_is_propagated() {
    let node = ScriptedNode::new();
    node.reply_always("platform.getCurrentValidators", json!({"validators": []}));
    let runner = runner(&node, &start_clock());

    let error = runner.wait_for_validator_addition("NodeA", Some("subnet-1")).unwrap_err();
    assert!(matches!(
        error,
        WorkflowError::Timeout { target: WaitTarget::Validator { ref subnet_id, .. }, .. } if subnet_id.as_deref() == Some("subnet-1")
    ));
    assert_eq!(node.calls_to("platform.getCurrentValidators")[0]["subnetID"], "subnet-1");
}

#[test]
fn start_time_in_the_past_returns_immediately() {
    let node = ScriptedNode::new();
    let clock = start_clock();
    let runner = runner(&node, &clock);

    runner.wait_for_start_time(START - 5);
    runner.wait_for_start_time(START);
    assert_eq!(clock.total_slept(), Duration::ZERO);
    assert!(node.methods().is_empty());
}

#[test]
fn fund_and_validate_seeds_the_xchain_twice() {
    let node = ScriptedNode::new();
    node.reply("info.getNodeID", json!({"nodeID": "NodeA"}))
        .reply_always("keystore.createUser", json!({"success": true}))
        .reply_always("avm.importKey", json!({"address": "X-genesis"}))
        .reply_always("avm.createAddress", json!({"address": "X-fresh"}))
        .reply_always("avm.send", json!({"txID": "seed-tx"}))
        .reply_always("avm.getTxStatus", json!({"status": "Accepted"}))
        .reply("platform.createAccount", json!({"address": "P-staker"}))
        .reply("avm.exportAVA", json!({"txID": "export-tx"}))
        .reply_always("platform.getAccount", account("0", "5000"))
        .reply("platform.importAVA", json!({"tx": "signed-import"}))
        .reply_always("platform.issueTx", json!({"txID": "issued-tx"}))
        .reply("platform.addDefaultSubnetValidator", json!({"unsignedTx": "unsigned-validator"}))
        .reply("platform.sign", json!({"tx": "signed-validator"}))
        .reply(
            "platform.getCurrentValidators",
            json!({"validators": [{"startTime": "1", "endTime": "2", "id": "NodeA"}]}),
        );
    let runner = runner(&node, &start_clock());

    runner.get_funds_and_start_validating(5_000, 2_000).unwrap();

    let milestones: Vec<String> = node
        .methods()
        .into_iter()
        .filter(|method| {
            matches!(
                method.as_str(),
                "info.getNodeID" | "avm.send" | "platform.createAccount" | "platform.addDefaultSubnetValidator"
            )
        })
        .collect();
    assert_eq!(
        milestones,
        [
            "info.getNodeID",
            "avm.send",
            "platform.createAccount",
            "avm.send",
            "platform.addDefaultSubnetValidator",
        ]
    );
    assert_eq!(node.calls_to("avm.createAddress").len(), 2);

    let validator = &node.calls_to("platform.addDefaultSubnetValidator")[0];
    assert_eq!(validator["id"], "NodeA");
    assert_eq!(validator["destination"], "P-staker");
    assert_eq!(validator["stakeAmount"], "2000");
}

#[test]
fn failing_step_short_circuits_the_workflow() {
    let node = ScriptedNode::new();
    node.reply("info.getNodeID", json!({"nodeID": "NodeA"}))
        .reply_always("keystore.createUser", json!({"success": true}))
        .fail("avm.importKey", "incorrect password");
    let runner = runner(&node, &start_clock());

    let error = runner.get_funds_and_start_validating(5_000, 2_000).unwrap_err();
    assert!(error.to_string().starts_with("Failed to take control of genesis account"));
    assert!(node.calls_to("avm.send").is_empty());
    assert!(!node.methods().iter().any(|method| method.starts_with("platform.")));
}
