mod common;

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, FixedBytes};
use serde_json::{Value, json};
use std::time::Duration;

use rollup_fee_indexer::indexer::{
    process_block, rpc::receipts::get_transaction_receipts, transformations::fees::FeeEngine,
};
use rollup_fee_indexer::models::common::{
    BASE_FEE_VAULT, ChainConfig, L1_FEE_VAULT, OPTIMISM_BEDROCK_BLOCK,
    OPTIMISM_GOERLI_FEE_ENFORCEMENT_BLOCK,
};
use rollup_fee_indexer::models::datasets::operations::TransactionOperations;
use rollup_fee_indexer::models::errors::{FeeError, IndexerError, LoaderError};

use common::MockRpc;

const TIMEOUT: Duration = Duration::from_secs(5);
const SEQUENCER: Address = Address::repeat_byte(0x42);
const SENDER: Address = Address::repeat_byte(0xab);

//////// Fixtures ////////

fn tx_hash(byte: u8) -> FixedBytes<32> {
    FixedBytes::repeat_byte(byte)
}

fn block_params(number: u64) -> Value {
    json!([BlockNumberOrTag::Number(number), true])
}

fn receipt_params(hash: FixedBytes<32>) -> Value {
    json!([hash])
}

fn block(number: u64, base_fee: Option<&str>, transactions: Vec<Value>) -> String {
    let mut block = json!({
        "hash": FixedBytes::<32>::repeat_byte(0xbb),
        "parentHash": FixedBytes::<32>::repeat_byte(0xcc),
        "number": format!("{number:#x}"),
        "timestamp": "0x64b6f2a0",
        "miner": SEQUENCER,
        "uncles": [],
        "transactions": transactions,
    });
    if let Some(base_fee) = base_fee {
        block["baseFeePerGas"] = base_fee.into();
    }
    block.to_string()
}

fn bedrock_tx(hash: FixedBytes<32>, number: u64) -> Value {
    json!({
        "type": "0x2",
        "hash": hash,
        "blockNumber": format!("{number:#x}"),
        "blockHash": FixedBytes::<32>::repeat_byte(0xbb),
        "from": SENDER,
        "nonce": "0x7",
        "gas": "0x5208",
        "gasPrice": "0x8",
        "maxFeePerGas": "0x10",
        "maxPriorityFeePerGas": "0x1",
        "to": Address::repeat_byte(0x01),
        "value": "0x0",
        "input": "0x"
    })
}

fn deposit_tx(hash: FixedBytes<32>, number: u64) -> Value {
    json!({
        "type": "0x7e",
        "hash": hash,
        "blockNumber": format!("{number:#x}"),
        "from": "0xdeaddeaddeaddeaddeaddeaddeaddeaddead0001",
        "sourceHash": FixedBytes::<32>::repeat_byte(0x05),
        "mint": "0x0",
        "isSystemTx": false,
        "gas": "0xf4240",
        "to": "0x4200000000000000000000000000000000000015",
        "value": "0x0",
        "input": "0x"
    })
}

fn legacy_tx(hash: FixedBytes<32>, number: u64) -> Value {
    json!({
        "hash": hash,
        "blockNumber": format!("{number:#x}"),
        "from": SENDER,
        "nonce": "0x0",
        "gas": "0x5208",
        "gasPrice": "0x0",
        "to": Address::repeat_byte(0x01),
        "value": "0x0",
        "input": "0x",
        "queueOrigin": "sequencer"
    })
}

fn receipt(
    hash: FixedBytes<32>,
    gas_used: &str,
    effective_gas_price: Option<&str>,
    l1_fee: Option<&str>,
) -> String {
    let mut receipt = json!({
        "transactionHash": hash,
        "status": "0x1",
        "gasUsed": gas_used,
    });
    if let Some(price) = effective_gas_price {
        receipt["effectiveGasPrice"] = price.into();
    }
    if let Some(l1_fee) = l1_fee {
        receipt["l1Fee"] = l1_fee.into();
    }
    receipt.to_string()
}

fn values(tx: &TransactionOperations) -> Vec<&str> {
    tx.operations
        .iter()
        .map(|op| op.amount.value.as_str())
        .collect()
}

//////// Tests ////////

#[tokio::test]
async fn test_bedrock_block_end_to_end() {
    let number = OPTIMISM_BEDROCK_BLOCK + 100;
    let rpc = MockRpc::new();
    rpc.respond(
        "eth_getBlockByNumber",
        block_params(number),
        &block(
            number,
            Some("0x2"),
            vec![deposit_tx(tx_hash(0x01), number), bedrock_tx(tx_hash(0x02), number)],
        ),
    );
    rpc.respond(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x01)),
        &receipt(tx_hash(0x01), "0xb71b", None, None),
    );
    // 100 gas at 8 wei plus an L1 fee of 150
    rpc.respond(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x02)),
        &receipt(tx_hash(0x02), "0x64", Some("0x8"), Some("0x96")),
    );

    let engine = FeeEngine::new(ChainConfig::optimism());
    let output = process_block(&rpc, &engine, BlockNumberOrTag::Number(number), TIMEOUT, None)
        .await
        .unwrap();

    assert_eq!(output.len(), 2);

    // Deposits are free
    assert_eq!(output[0].tx_hash, tx_hash(0x01));
    assert!(output[0].operations.is_empty());

    let tx = &output[1];
    assert_eq!(tx.chain_id, 10);
    assert_eq!(tx.block_number, number);
    assert_eq!(tx.block_time.timestamp(), 0x64b6f2a0);
    assert_eq!(values(tx), ["-950", "600", "200", "150"]);

    let accounts: Vec<_> = tx
        .operations
        .iter()
        .map(|op| op.account.address.clone())
        .collect();
    assert_eq!(
        accounts,
        [
            SENDER.to_checksum(None),
            SEQUENCER.to_checksum(None),
            BASE_FEE_VAULT.to_checksum(None),
            L1_FEE_VAULT.to_checksum(None),
        ]
    );

    let line = serde_json::to_value(tx).unwrap();
    assert_eq!(line["operations"][1]["related_operations"][0]["index"], 0);
    assert_eq!(line["operations"][3]["type"], "FEE");
    assert_eq!(line["operations"][3]["status"], "SUCCESS");
}

#[tokio::test]
async fn test_legacy_block_goerli_override() {
    let chain = ChainConfig::optimism_goerli();
    let engine = FeeEngine::new(chain);
    let rpc = MockRpc::new();

    let below = OPTIMISM_GOERLI_FEE_ENFORCEMENT_BLOCK - 1;
    let above = OPTIMISM_GOERLI_FEE_ENFORCEMENT_BLOCK;
    for (number, byte) in [(below, 0x0a), (above, 0x0b)] {
        rpc.respond(
            "eth_getBlockByNumber",
            block_params(number),
            &block(number, None, vec![legacy_tx(tx_hash(byte), number)]),
        );
        rpc.respond(
            "eth_getTransactionReceipt",
            receipt_params(tx_hash(byte)),
            &receipt(tx_hash(byte), "0x5208", None, Some("0x10")),
        );
    }

    let output = process_block(&rpc, &engine, BlockNumberOrTag::Number(below), TIMEOUT, None)
        .await
        .unwrap();
    assert_eq!(values(&output[0]), ["0", "0"]);

    let output = process_block(&rpc, &engine, BlockNumberOrTag::Number(above), TIMEOUT, None)
        .await
        .unwrap();
    assert_eq!(values(&output[0]), ["-16", "16"]);
}

#[tokio::test]
async fn test_empty_block_skips_receipts() {
    let number = OPTIMISM_BEDROCK_BLOCK;
    let rpc = MockRpc::new();
    rpc.respond(
        "eth_getBlockByNumber",
        block_params(number),
        &block(number, Some("0x1"), vec![]),
    );

    let engine = FeeEngine::new(ChainConfig::optimism());
    let output = process_block(&rpc, &engine, BlockNumberOrTag::Number(number), TIMEOUT, None)
        .await
        .unwrap();

    assert!(output.is_empty());
    assert_eq!(rpc.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_block_is_not_found() {
    let rpc = MockRpc::new();
    let engine = FeeEngine::new(ChainConfig::optimism());

    let err = process_block(&rpc, &engine, BlockNumberOrTag::Number(1), TIMEOUT, None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_transport_error_is_retryable() {
    let number = OPTIMISM_BEDROCK_BLOCK;
    let rpc = MockRpc::new();
    rpc.fail("eth_getBlockByNumber", block_params(number), "connection reset");

    let engine = FeeEngine::new(ChainConfig::optimism());
    let err = process_block(&rpc, &engine, BlockNumberOrTag::Number(number), TIMEOUT, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IndexerError::Loader(LoaderError::Transport { .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_node_times_out() {
    let rpc = MockRpc::with_delay(Duration::from_millis(500));
    let engine = FeeEngine::new(ChainConfig::optimism());

    let err = process_block(
        &rpc,
        &engine,
        BlockNumberOrTag::Number(1),
        Duration::from_millis(10),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, IndexerError::Loader(LoaderError::Timeout { .. })));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_receipt_batch_isolates_failures() {
    let rpc = MockRpc::new();
    rpc.respond(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x01)),
        &receipt(tx_hash(0x01), "0x1", None, None),
    );
    rpc.fail(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x02)),
        "execution aborted",
    );

    let receipts = get_transaction_receipts(
        &rpc,
        &[tx_hash(0x01), tx_hash(0x02), tx_hash(0x03)],
        TIMEOUT,
        None,
    )
    .await
    .unwrap();

    assert_eq!(receipts.len(), 3);
    assert!(receipts[0].is_ok());
    assert!(matches!(receipts[1], Err(LoaderError::Transport { .. })));
    assert!(matches!(receipts[2], Err(LoaderError::NotFound { .. })));
}

#[tokio::test]
async fn test_failed_receipt_fails_the_whole_block() {
    let number = OPTIMISM_BEDROCK_BLOCK + 1;
    let rpc = MockRpc::new();
    rpc.respond(
        "eth_getBlockByNumber",
        block_params(number),
        &block(
            number,
            Some("0x1"),
            vec![bedrock_tx(tx_hash(0x01), number), bedrock_tx(tx_hash(0x02), number)],
        ),
    );
    rpc.respond(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x01)),
        &receipt(tx_hash(0x01), "0x1", Some("0x8"), None),
    );

    let engine = FeeEngine::new(ChainConfig::optimism());
    let err = process_block(&rpc, &engine, BlockNumberOrTag::Number(number), TIMEOUT, None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_base_fee_above_charged_price_fails_the_block() {
    // 100 gas at 8 wei is charged but the header base fee is 16 wei
    let number = OPTIMISM_BEDROCK_BLOCK + 2;
    let rpc = MockRpc::new();
    rpc.respond(
        "eth_getBlockByNumber",
        block_params(number),
        &block(number, Some("0x10"), vec![bedrock_tx(tx_hash(0x01), number)]),
    );
    rpc.respond(
        "eth_getTransactionReceipt",
        receipt_params(tx_hash(0x01)),
        &receipt(tx_hash(0x01), "0x64", Some("0x8"), Some("0x96")),
    );

    let engine = FeeEngine::new(ChainConfig::optimism());
    let err = process_block(&rpc, &engine, BlockNumberOrTag::Number(number), TIMEOUT, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IndexerError::Fee(FeeError::Underflow { tx_hash: hash, .. }) if hash == tx_hash(0x01)
    ));
    // Neither retried nor polled: the runner stops on it
    assert!(!err.is_retryable());
    assert!(!err.is_not_found());
}
