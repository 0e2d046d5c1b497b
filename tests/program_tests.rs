use solana_program::{borsh::try_from_slice_unchecked, program_pack::Pack};
use solana_program_test::*;
use solana_sdk::{
    account::Account,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::rent::Rent,
    transaction::{Transaction, TransactionError},
};
use spl_token::state::{Account as TokenAccount, AccountState};

use lottery_core::{
    constants::MAX_ENTRIES,
    error::LotteryError,
    instruction,
    machine::LotteryStateMachine,
    price::PriceFeed,
    process_instruction,
    state::{LotteryConfig, RoundPhase},
    utils::{find_config_address, find_funding_token_address, find_lottery_address},
};

const USD_ENTRY_FEE: u64 = 50;
const MINIMUM_FUNDING: u64 = 1_000;
// 50 USD at 2000 USD/SOL
const ENTRY_FEE: u64 = 25_000_000;

struct TestLottery {
    banks_client: BanksClient,
    payer: Keypair,
    program_id: Pubkey,
    oracle: Keypair,
    price_feed: Pubkey,
    funding_token_account: Pubkey,
}

fn price_feed_account(price: i64, decimals: u8) -> Account {
    let mut data = vec![0; PriceFeed::LEN];
    PriceFeed {
        is_initialized: true,
        price,
        decimals,
    }
    .pack_into_slice(&mut data);

    Account {
        lamports: Rent::default().minimum_balance(PriceFeed::LEN),
        data,
        owner: Pubkey::new_unique(),
        executable: false,
        rent_epoch: 0,
    }
}

fn funding_account(mint: &Pubkey, holder: &Pubkey, amount: u64) -> Account {
    let mut data = vec![0; TokenAccount::LEN];
    TokenAccount {
        mint: *mint,
        owner: *holder,
        amount,
        state: AccountState::Initialized,
        ..TokenAccount::default()
    }
    .pack_into_slice(&mut data);

    Account {
        lamports: Rent::default().minimum_balance(TokenAccount::LEN),
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

// Starts the program with a 2000 USD/SOL price feed and a funding account holding `funding`
async fn setup(funding: u64) -> TestLottery {
    let program_id = Pubkey::new_unique();
    let mut program_test = ProgramTest::new(
        "lottery_core",
        program_id,
        processor!(process_instruction),
    );

    let price_feed = Pubkey::new_unique();
    program_test.add_account(price_feed, price_feed_account(200_000_000_000, 8));

    let mint = Pubkey::new_unique();
    let (lottery, _) = find_lottery_address(&program_id);
    let funding_token_account = find_funding_token_address(&program_id, &mint);
    program_test.add_account(
        funding_token_account,
        funding_account(&mint, &lottery, funding),
    );

    let (banks_client, payer, _) = program_test.start().await;

    TestLottery {
        banks_client,
        payer,
        program_id,
        oracle: Keypair::new(),
        price_feed,
        funding_token_account,
    }
}

impl TestLottery {
    async fn process(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), BanksClientError> {
        let recent_blockhash = self.banks_client.get_latest_blockhash().await.unwrap();
        let mut transaction =
            Transaction::new_with_payer(instructions, Some(&self.payer.pubkey()));
        let mut all_signers = vec![&self.payer];
        all_signers.extend_from_slice(signers);
        transaction.sign(&all_signers, recent_blockhash);
        self.banks_client.process_transaction(transaction).await
    }

    async fn initialize(&mut self) {
        let ix = instruction::initialize(
            &self.program_id,
            &self.payer.pubkey(),
            &self.oracle.pubkey(),
            &self.price_feed,
            &self.funding_token_account,
            USD_ENTRY_FEE,
            MINIMUM_FUNDING,
        );
        self.process(&[ix], &[]).await.unwrap();
    }

    async fn open_round(&mut self) -> Result<(), BanksClientError> {
        let ix = instruction::open_round(&self.program_id, &self.payer.pubkey(), &self.price_feed);
        self.process(&[ix], &[]).await
    }

    async fn close_round(&mut self) -> Result<(), BanksClientError> {
        let ix = instruction::close_round(
            &self.program_id,
            &self.payer.pubkey(),
            &self.funding_token_account,
        );
        self.process(&[ix], &[]).await
    }

    async fn fund_participant(&mut self) -> Keypair {
        let participant = Keypair::new();
        let ix = system_instruction::transfer(
            &self.payer.pubkey(),
            &participant.pubkey(),
            1_000_000_000,
        );
        self.process(&[ix], &[]).await.unwrap();
        participant
    }

    async fn enter(&mut self, participant: &Keypair, paid_amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter(&self.program_id, &participant.pubkey(), paid_amount);
        self.process(&[ix], &[participant]).await
    }

    async fn fulfill(
        &mut self,
        winner: &Pubkey,
        request_id: [u8; 32],
        random_value: u64,
    ) -> Result<(), BanksClientError> {
        let mut randomness = [0u8; 32];
        randomness[..8].copy_from_slice(&random_value.to_le_bytes());
        let ix = instruction::fulfill_randomness(
            &self.program_id,
            &self.oracle.pubkey(),
            winner,
            request_id,
            randomness,
        );
        let oracle = Keypair::from_bytes(&self.oracle.to_bytes()).unwrap();
        self.process(&[ix], &[&oracle]).await
    }

    async fn lottery_state(&mut self) -> LotteryStateMachine {
        let (lottery, _) = find_lottery_address(&self.program_id);
        let account = self.banks_client.get_account(lottery).await.unwrap().unwrap();
        try_from_slice_unchecked::<LotteryStateMachine>(&account.data).unwrap()
    }

    async fn balance(&mut self, address: Pubkey) -> u64 {
        self.banks_client.get_balance(address).await.unwrap()
    }
}

fn transaction_error(err: BanksClientError) -> TransactionError {
    err.unwrap()
}

fn custom(error: LotteryError) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(error as u32))
}

#[tokio::test]
async fn test_initialize() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;

    let (config_pubkey, _) = find_config_address(&test.program_id);
    let config_account = test.banks_client.get_account(config_pubkey).await.unwrap().unwrap();
    let config = LotteryConfig::unpack(&config_account.data).unwrap();

    assert!(config.is_initialized);
    assert_eq!(config.admin, test.payer.pubkey());
    assert_eq!(config.oracle_authority, test.oracle.pubkey());
    assert_eq!(config.price_feed, test.price_feed);
    assert_eq!(config.funding_token_account, test.funding_token_account);
    assert_eq!(config.usd_entry_fee, USD_ENTRY_FEE);
    assert_eq!(config.minimum_funding, MINIMUM_FUNDING);

    let lottery = test.lottery_state().await;
    assert_eq!(lottery, LotteryStateMachine::new());
}

#[tokio::test]
async fn test_full_round() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;
    test.open_round().await.unwrap();

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Open);
    assert_eq!(lottery.entry_fee(), ENTRY_FEE);
    assert_eq!(lottery.round_id(), 1);

    let alice = test.fund_participant().await;
    let bob = test.fund_participant().await;
    let carol = test.fund_participant().await;
    for participant in [&alice, &bob, &carol] {
        test.enter(participant, ENTRY_FEE).await.unwrap();
    }

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_pot(), 75_000_000);
    assert_eq!(
        lottery.ledger().entries(),
        &[alice.pubkey(), bob.pubkey(), carol.pubkey()]
    );

    test.close_round().await.unwrap();
    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Calculating);
    let request_id = lottery.pending_request().unwrap().request_id;

    // entries are closed while the draw is pending
    let dave = test.fund_participant().await;
    assert_eq!(
        transaction_error(test.enter(&dave, ENTRY_FEE).await.unwrap_err()),
        custom(LotteryError::WrongPhase)
    );

    // 777 % 3 == 0 selects alice
    let before = test.balance(alice.pubkey()).await;
    test.fulfill(&alice.pubkey(), request_id.to_bytes(), 777)
        .await
        .unwrap();
    assert_eq!(test.balance(alice.pubkey()).await, before + 75_000_000);

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Closed);
    assert_eq!(lottery.current_pot(), 0);
    assert_eq!(lottery.ledger().count(), 0);
    let receipt = lottery.recent_winner().unwrap();
    assert_eq!(receipt.winner, alice.pubkey());
    assert_eq!(receipt.amount_paid, 75_000_000);

    // replay with a different payload so the transaction is not a duplicate
    assert_eq!(
        transaction_error(
            test.fulfill(&alice.pubkey(), request_id.to_bytes(), 778)
                .await
                .unwrap_err()
        ),
        custom(LotteryError::UnknownRequestId)
    );
    assert_eq!(test.balance(alice.pubkey()).await, before + 75_000_000);
}

#[tokio::test]
async fn test_enter_with_wrong_fee() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;

    let alice = test.fund_participant().await;
    assert_eq!(
        transaction_error(test.enter(&alice, ENTRY_FEE).await.unwrap_err()),
        custom(LotteryError::WrongPhase)
    );

    test.open_round().await.unwrap();
    let balance = test.balance(alice.pubkey()).await;
    assert_eq!(
        transaction_error(test.enter(&alice, ENTRY_FEE - 1).await.unwrap_err()),
        custom(LotteryError::IncorrectFee)
    );

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.ledger().count(), 0);
    assert_eq!(lottery.current_pot(), 0);
    assert_eq!(test.balance(alice.pubkey()).await, balance);
}

#[tokio::test]
async fn test_close_without_funding() {
    let mut test = setup(MINIMUM_FUNDING - 1).await;
    test.initialize().await;
    test.open_round().await.unwrap();

    let alice = test.fund_participant().await;
    test.enter(&alice, ENTRY_FEE).await.unwrap();

    assert_eq!(
        transaction_error(test.close_round().await.unwrap_err()),
        custom(LotteryError::InsufficientFunding)
    );
    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Open);
    assert!(lottery.pending_request().is_none());
}

#[tokio::test]
async fn test_fulfill_from_wrong_signer() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;
    test.open_round().await.unwrap();

    let alice = test.fund_participant().await;
    test.enter(&alice, ENTRY_FEE).await.unwrap();
    test.close_round().await.unwrap();
    let request_id = test.lottery_state().await.pending_request().unwrap().request_id;

    let impostor = Keypair::new();
    let ix = instruction::fulfill_randomness(
        &test.program_id,
        &impostor.pubkey(),
        &alice.pubkey(),
        request_id.to_bytes(),
        [0; 32],
    );
    assert_eq!(
        transaction_error(test.process(&[ix], &[&impostor]).await.unwrap_err()),
        custom(LotteryError::NotAuthorized)
    );

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Calculating);
    assert_eq!(lottery.pending_request().unwrap().request_id, request_id);
}

#[tokio::test]
async fn test_update_entry_fee_applies_next_round() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;

    let ix = instruction::update_entry_fee(&test.program_id, &test.payer.pubkey(), 100);
    test.process(&[ix], &[]).await.unwrap();
    test.open_round().await.unwrap();

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.entry_fee(), 2 * ENTRY_FEE);
}

#[tokio::test]
async fn test_enter_beyond_capacity() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;
    test.open_round().await.unwrap();

    // ten participants, ten entries each, one transaction per participant
    for _ in 0..MAX_ENTRIES / 10 {
        let participant = test.fund_participant().await;
        let entries: Vec<Instruction> = (0..10)
            .map(|_| instruction::enter(&test.program_id, &participant.pubkey(), ENTRY_FEE))
            .collect();
        test.process(&entries, &[&participant]).await.unwrap();
    }

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.ledger().count(), MAX_ENTRIES);
    assert_eq!(lottery.current_pot(), MAX_ENTRIES as u64 * ENTRY_FEE);

    let late = test.fund_participant().await;
    assert_eq!(
        transaction_error(test.enter(&late, ENTRY_FEE).await.unwrap_err()),
        custom(LotteryError::RoundFull)
    );

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.ledger().count(), MAX_ENTRIES);
    assert_eq!(lottery.current_pot(), MAX_ENTRIES as u64 * ENTRY_FEE);

    // a full round still closes and settles
    test.close_round().await.unwrap();
    assert_eq!(
        test.lottery_state().await.current_phase(),
        RoundPhase::Calculating
    );
}

#[tokio::test]
async fn test_fulfill_with_wrong_winner_account_reverts() {
    let mut test = setup(MINIMUM_FUNDING).await;
    test.initialize().await;
    test.open_round().await.unwrap();

    let alice = test.fund_participant().await;
    let bob = test.fund_participant().await;
    let carol = test.fund_participant().await;
    for participant in [&alice, &bob, &carol] {
        test.enter(participant, ENTRY_FEE).await.unwrap();
    }
    test.close_round().await.unwrap();
    let request_id = test.lottery_state().await.pending_request().unwrap().request_id;

    let (lottery_address, _) = find_lottery_address(&test.program_id);
    let pot_balance = test.balance(lottery_address).await;
    let bob_balance = test.balance(bob.pubkey()).await;

    // 777 % 3 == 0 selects alice, not bob
    assert_eq!(
        transaction_error(
            test.fulfill(&bob.pubkey(), request_id.to_bytes(), 777)
                .await
                .unwrap_err()
        ),
        custom(LotteryError::PayoutFailed)
    );

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Calculating);
    assert_eq!(lottery.pending_request().unwrap().request_id, request_id);
    assert_eq!(lottery.current_pot(), 75_000_000);
    assert_eq!(lottery.ledger().count(), 3);
    assert!(!lottery.is_stalled());
    assert_eq!(test.balance(lottery_address).await, pot_balance);
    assert_eq!(test.balance(bob.pubkey()).await, bob_balance);

    let alice_balance = test.balance(alice.pubkey()).await;
    test.fulfill(&alice.pubkey(), request_id.to_bytes(), 777)
        .await
        .unwrap();
    assert_eq!(test.balance(alice.pubkey()).await, alice_balance + 75_000_000);
    assert_eq!(test.balance(lottery_address).await, pot_balance - 75_000_000);

    let lottery = test.lottery_state().await;
    assert_eq!(lottery.current_phase(), RoundPhase::Closed);
    assert_eq!(lottery.current_pot(), 0);
    assert_eq!(lottery.recent_winner().unwrap().winner, alice.pubkey());
}
