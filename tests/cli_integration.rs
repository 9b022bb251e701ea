use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;

const ALICE_SCRIPT: &str = "76a914e4c1ea86373d554b8f4efff2cfb0001ea19124d288ac";
const ALICE_PUBKEY: &str = "036666dd712e05a487916384bfcd5973eb53e8038eccbbf97f7eed775b87389536";
const ALICE_KEY: &str = "56429688a1a6b00b90ccd22a0de0a376b6569d8684022ae92229a28478bfb657";
const ALICE_SIGNATURE: &str = "3044022078eda020d4b86fcb3af78ef919912e6d79b81164dbbb0b0b96da6ac58a2de4b102201a5fd8d48734d5a02371c4b5ee551a69dca3842edbf577d863cf8ae9fdbbd459";
const SIGHASH: &str = "6a0e072da66b141fdb448323d54765cafcaf084a06d2fa13c8aed0c694e50d18";
const TXID: &str = "c19f410bf1d70864220e93bca20f836aaaf8cdde84a46692616e9f4480d54885";
const ENCODED: &str = "02000000017be4e642bb278018ab12277de9427773ad1c5f5b1d164a157e0d99aa48dc1c1e000000006a473044022078eda020d4b86fcb3af78ef919912e6d79b81164dbbb0b0b96da6ac58a2de4b102201a5fd8d48734d5a02371c4b5ee551a69dca3842edbf577d863cf8ae9fdbbd4590121036666dd712e05a487916384bfcd5973eb53e8038eccbbf97f7eed775b87389536ffffffff01c0aff629010000001976a9145eaaa4f458f9158f86afcba08dd7448d27045e3d88ac00000000";

/// One P2PKH coin of 50 BTC paid to Bob's legacy address, 0.01 BTC left as fee
fn legacy_request() -> Value {
    json!({
        "coin": "bitcoin",
        "version": 2,
        "utxos": [{
            "outpoint": {
                "hash": "7be4e642bb278018ab12277de9427773ad1c5f5b1d164a157e0d99aa48dc1c1e",
                "vout": 0
            },
            "value": 5_000_000_000u64,
            "script": ALICE_SCRIPT
        }],
        "outputs": [{
            "to": { "address": "19dYwcMgeK3KKrc2GzzbRLWK5B6eGytay5" },
            "value": 4_999_000_000u64
        }],
        "byte_fee": 1,
        "policy": "use_all",
        "dust_threshold": 546
    })
}

fn run_cli(args: &[&str], stdin: &Value) -> (bool, Value) {
    let binary_path = assert_cmd::cargo::cargo_bin!("utxo-compiler");
    let output = Command::new(binary_path)
        .args(args)
        .write_stdin(stdin.to_string())
        .output()
        .expect("cli runs");

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let response: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    (output.status.success(), response)
}

#[test]
fn cli_plan_reports_fee_and_inputs() {
    let (ok, response) = run_cli(&["plan"], &legacy_request());

    assert!(ok, "plan failed: {}", response);
    assert_eq!(response["success"], true);
    let data = &response["data"];
    assert_eq!(data["fee"], 1_000_000);
    assert_eq!(data["change"], 0);
    assert_eq!(data["selected_inputs"].as_array().unwrap().len(), 1);
    assert_eq!(data["outputs"][0]["value"], 4_999_000_000u64);
}

#[test]
fn cli_preimage_hashes_lists_sighash() {
    let (ok, response) = run_cli(&["preimage-hashes"], &legacy_request());

    assert!(ok, "preimage-hashes failed: {}", response);
    let preimages = response["data"]["preimages"].as_array().unwrap();
    assert_eq!(preimages.len(), 1);
    assert_eq!(preimages[0]["preimage_hash"], SIGHASH);
    assert_eq!(preimages[0]["required_pub_key_hash"], &ALICE_SCRIPT[6..46]);
    assert_eq!(preimages[0]["signing_method"], "ecdsa");
    assert_eq!(response["data"]["error"], "ok");
}

#[test]
fn cli_compile_assembles_external_signature() {
    let request = json!({
        "input": legacy_request(),
        "signatures": [ALICE_SIGNATURE],
        "public_keys": [ALICE_PUBKEY]
    });
    let (ok, response) = run_cli(&["compile"], &request);

    assert!(ok, "compile failed: {}", response);
    assert_eq!(response["data"]["encoded"], ENCODED);
    assert_eq!(response["data"]["txid"], TXID);
    assert_eq!(response["data"]["fee"], 1_000_000);
}

#[test]
fn cli_sign_matches_compile() {
    let mut request = legacy_request();
    request["private_keys"] = json!([ALICE_KEY]);
    let (ok, response) = run_cli(&["sign"], &request);

    assert!(ok, "sign failed: {}", response);
    assert_eq!(response["data"]["encoded"], ENCODED);
    assert_eq!(response["data"]["txid"], TXID);
}

#[test]
fn cli_reads_request_from_file() {
    let path = std::env::temp_dir().join(format!("utxo-compiler-plan-{}.json", std::process::id()));
    fs::write(&path, legacy_request().to_string()).expect("write request");

    let binary_path = assert_cmd::cargo::cargo_bin!("utxo-compiler");
    let assert = Command::new(binary_path)
        .args(["plan", "--input"])
        .arg(&path)
        .assert()
        .success();
    let response: Value = serde_json::from_slice(&assert.get_output().stdout).expect("valid json");
    assert_eq!(response["data"]["fee"], 1_000_000);

    let _ = fs::remove_file(&path);
}

#[test]
fn cli_missing_signature_exits_with_failure() {
    let request = json!({
        "input": legacy_request(),
        "signatures": [],
        "public_keys": []
    });
    let (ok, response) = run_cli(&["compile"], &request);

    assert!(!ok);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["code"], "incomplete_plan");
}

#[test]
fn cli_insufficient_funds_exits_with_failure() {
    let mut request = legacy_request();
    request["outputs"][0]["value"] = json!(6_000_000_000u64);
    let (ok, response) = run_cli(&["plan"], &request);

    assert!(!ok);
    assert_eq!(response["error"]["code"], "insufficient_funds");
}

#[test]
fn cli_malformed_request_is_reported_as_json() {
    let (ok, response) = run_cli(&["plan"], &json!({ "coin": "bitcoin" }));

    assert!(!ok);
    assert_eq!(response["success"], false);
    assert!(response["error"]["message"].as_str().is_some());
}

#[test]
fn cli_missing_file_is_an_error() {
    let binary_path = assert_cmd::cargo::cargo_bin!("utxo-compiler");
    let assert = Command::new(binary_path)
        .args(["plan", "--input", "/nonexistent/request.json"])
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("ERROR [cli]"), "unexpected stderr: {}", stderr);
    assert!(stderr.contains("reading request"), "unexpected stderr: {}", stderr);
}
