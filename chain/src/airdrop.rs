//! Batched SPL token airdrop planning.
//!
//! Recipients whose associated token account already exists pack into larger
//! batches than recipients needing account creation, since each create
//! instruction costs materially more transaction space and compute. Every
//! batch becomes one transaction the sending wallet signs; batches are
//! submitted one at a time and a failed batch never rolls back earlier ones.

use crate::error::Error;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

/// Transfers per transaction when every recipient account exists.
pub const TRANSFER_BATCH_SIZE: usize = 18;
/// Transfers per transaction when account creation is interleaved.
pub const CREATE_BATCH_SIZE: usize = 8;

const GET_MULTIPLE_ACCOUNTS_CHUNK: usize = 100;

pub const TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");

// Shared instruction tags of spl-token and token-2022.
const TOKEN_IX_TRANSFER: u8 = 3;
const ATA_IX_CREATE_IDEMPOTENT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub wallet: Pubkey,
    /// Base units of the airdropped mint.
    pub amount: u64,
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub recipients: Vec<Recipient>,
    pub creates_accounts: bool,
}

pub fn derive_token_account(wallet: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

/// Splits recipients by whether their token account for `mint` exists.
pub async fn partition_recipients(
    rpc: &RpcClient,
    mint: &Pubkey,
    token_program: &Pubkey,
    recipients: Vec<Recipient>,
) -> Result<(Vec<Recipient>, Vec<Recipient>), Error> {
    let mut existing = Vec::new();
    let mut missing = Vec::new();

    for chunk in recipients.chunks(GET_MULTIPLE_ACCOUNTS_CHUNK) {
        let addresses: Vec<Pubkey> = chunk
            .iter()
            .map(|r| derive_token_account(&r.wallet, mint, token_program))
            .collect();
        let accounts = rpc.get_multiple_accounts(&addresses).await?;

        for (recipient, account) in chunk.iter().zip(accounts) {
            if account.is_some() {
                existing.push(*recipient);
            } else {
                missing.push(*recipient);
            }
        }
    }

    Ok((existing, missing))
}

/// Packs partitioned recipients into batches: transfer-only batches of up to
/// [`TRANSFER_BATCH_SIZE`], then creation batches of up to
/// [`CREATE_BATCH_SIZE`]. Each recipient lands in exactly one batch.
pub fn plan_batches(existing: &[Recipient], missing: &[Recipient]) -> Vec<Batch> {
    let mut batches = Vec::new();

    for chunk in existing.chunks(TRANSFER_BATCH_SIZE) {
        batches.push(Batch {
            recipients: chunk.to_vec(),
            creates_accounts: false,
        });
    }
    for chunk in missing.chunks(CREATE_BATCH_SIZE) {
        batches.push(Batch {
            recipients: chunk.to_vec(),
            creates_accounts: true,
        });
    }

    batches
}

fn create_token_account_instruction(
    funder: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let token_account = derive_token_account(owner, mint, token_program);
    Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*funder, true),
            AccountMeta::new(token_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data: vec![ATA_IX_CREATE_IDEMPOTENT],
    }
}

// Hand-built so the same path serves spl-token and token-2022 mints; the
// transfer layout (tag 3 + u64 amount) is identical in both programs.
fn transfer_instruction(
    token_program: &Pubkey,
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(TOKEN_IX_TRANSFER);
    data.extend_from_slice(&amount.to_le_bytes());
    Instruction {
        program_id: *token_program,
        accounts: vec![
            AccountMeta::new(*source, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        data,
    }
}

/// One unsigned transaction for a batch, fee payer = `sender`. The sender's
/// wallet signs it client side before submission.
pub fn build_batch_transaction(
    sender: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    batch: &Batch,
    recent_blockhash: Hash,
) -> Transaction {
    let sender_token_account = derive_token_account(sender, mint, token_program);
    let mut instructions = Vec::new();

    for recipient in &batch.recipients {
        let recipient_token_account = derive_token_account(&recipient.wallet, mint, token_program);
        if batch.creates_accounts {
            instructions.push(create_token_account_instruction(
                sender,
                &recipient.wallet,
                mint,
                token_program,
            ));
        }
        instructions.push(transfer_instruction(
            token_program,
            &sender_token_account,
            &recipient_token_account,
            sender,
            recipient.amount,
        ));
    }

    let mut message = Message::new(&instructions, Some(sender));
    message.recent_blockhash = recent_blockhash;
    Transaction::new_unsigned(message)
}

/// Submits one signed batch transaction and waits for confirmation.
pub async fn submit_batch(
    rpc: &RpcClient,
    transaction: &Transaction,
) -> Result<solana_sdk::signature::Signature, Error> {
    let signature = rpc.send_and_confirm_transaction(transaction).await?;
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipients(n: usize) -> Vec<Recipient> {
        (0..n)
            .map(|i| Recipient {
                wallet: Pubkey::new_unique(),
                amount: (i as u64 + 1) * 1_000,
            })
            .collect()
    }

    #[test]
    fn every_recipient_lands_in_exactly_one_batch() {
        let existing = recipients(40);
        let missing = recipients(20);
        let batches = plan_batches(&existing, &missing);

        let mut seen: Vec<Recipient> = batches
            .iter()
            .flat_map(|b| b.recipients.iter().copied())
            .collect();
        assert_eq!(seen.len(), 60);

        let mut expected: Vec<Recipient> = existing.iter().chain(&missing).copied().collect();
        seen.sort_by_key(|r| r.wallet.to_bytes());
        expected.sort_by_key(|r| r.wallet.to_bytes());
        assert_eq!(seen, expected);
    }

    #[test]
    fn batch_sizes_respect_mode_limits() {
        let batches = plan_batches(&recipients(37), &recipients(17));
        for batch in &batches {
            if batch.creates_accounts {
                assert!(batch.recipients.len() <= CREATE_BATCH_SIZE);
            } else {
                assert!(batch.recipients.len() <= TRANSFER_BATCH_SIZE);
            }
            assert!(!batch.recipients.is_empty());
        }
        // 37 transfers -> 18 + 18 + 1, 17 creations -> 8 + 8 + 1.
        assert_eq!(batches.len(), 6);
    }

    #[test]
    fn empty_input_plans_nothing() {
        assert!(plan_batches(&[], &[]).is_empty());
    }

    #[test]
    fn creation_batches_carry_two_instructions_per_recipient() {
        let sender = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let token_program = Pubkey::new_unique();
        let batch = Batch {
            recipients: recipients(3),
            creates_accounts: true,
        };

        let tx = build_batch_transaction(&sender, &mint, &token_program, &batch, Hash::default());
        assert_eq!(tx.message.instructions.len(), 6);

        let transfer_only = Batch {
            creates_accounts: false,
            ..batch
        };
        let tx =
            build_batch_transaction(&sender, &mint, &token_program, &transfer_only, Hash::default());
        assert_eq!(tx.message.instructions.len(), 3);
    }

    #[test]
    fn transfer_instruction_encodes_amount() {
        let ix = transfer_instruction(
            &TOKEN_PROGRAM_ID,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            123_456_789,
        );
        assert_eq!(ix.data[0], TOKEN_IX_TRANSFER);
        assert_eq!(u64::from_le_bytes(ix.data[1..9].try_into().unwrap()), 123_456_789);
        assert!(ix.accounts[2].is_signer);
    }
}
