//! Off-chain lottery driver.
//!
//! A single task owns the [`LotteryStateMachine`] and every collaborator.
//! Admin commands, participant entries and oracle fulfillments all go through
//! one mailbox, so they execute one at a time in arrival order.

use solana_program::{msg, pubkey::Pubkey};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::LotteryError;
use crate::interfaces::{FundingSource, PayoutSink, PriceSource, RandomnessOracle};
use crate::machine::{LotteryStateMachine, StalledRound};
use crate::settlement::SettlementEngine;
use crate::state::{RequestId, RoundPhase, WinnerReceipt};

/// External systems the lottery talks to
pub struct Collaborators {
    pub price_source: Box<dyn PriceSource + Send>,
    pub oracle: Box<dyn RandomnessOracle + Send>,
    pub funding_source: Box<dyn FundingSource + Send>,
    pub payout_sink: Box<dyn PayoutSink + Send>,
    /// Funding balance required to close a round
    pub minimum_funding: u64,
}

/// Point-in-time view of the round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundStatus {
    pub round_id: u64,
    pub phase: RoundPhase,
    pub entry_fee: u64,
    pub pot: u64,
    pub entries: Vec<Pubkey>,
    pub pending_request: Option<RequestId>,
    pub recent_winner: Option<WinnerReceipt>,
}

type Reply<T> = oneshot::Sender<Result<T, LotteryError>>;

enum Command {
    OpenRound {
        usd_fee: u64,
        reply: Reply<u64>,
    },
    Enter {
        participant: Pubkey,
        paid_amount: u64,
        reply: Reply<()>,
    },
    CloseRound {
        reply: Reply<RequestId>,
    },
    Fulfill {
        request_id: RequestId,
        random_value: u64,
        reply: Reply<WinnerReceipt>,
    },
    ResetStalledRound {
        reply: Reply<StalledRound>,
    },
    Status {
        reply: oneshot::Sender<RoundStatus>,
    },
}

/// Cloneable handle to a running lottery
#[derive(Clone)]
pub struct LotteryHandle {
    commands: mpsc::Sender<Command>,
}

/// Spawns the lottery task. The join handle yields the final state once every handle is dropped.
pub fn spawn_lottery(
    lottery: LotteryStateMachine,
    collaborators: Collaborators,
    mailbox_capacity: usize,
) -> (LotteryHandle, JoinHandle<LotteryStateMachine>) {
    let (commands, mailbox) = mpsc::channel(mailbox_capacity);
    let task = tokio::spawn(run(lottery, collaborators, mailbox));
    (LotteryHandle { commands }, task)
}

async fn run(
    mut lottery: LotteryStateMachine,
    mut collaborators: Collaborators,
    mut mailbox: mpsc::Receiver<Command>,
) -> LotteryStateMachine {
    while let Some(command) = mailbox.recv().await {
        match command {
            Command::OpenRound { usd_fee, reply } => {
                let result =
                    lottery.open_round_with_source(usd_fee, collaborators.price_source.as_ref());
                let _ = reply.send(result);
            }
            Command::Enter {
                participant,
                paid_amount,
                reply,
            } => {
                let _ = reply.send(lottery.enter(participant, paid_amount));
            }
            Command::CloseRound { reply } => {
                let result = collaborators
                    .funding_source
                    .funding_balance()
                    .and_then(|balance| {
                        lottery.close_and_request_randomness(
                            collaborators.oracle.as_mut(),
                            balance,
                            collaborators.minimum_funding,
                        )
                    });
                let _ = reply.send(result);
            }
            Command::Fulfill {
                request_id,
                random_value,
                reply,
            } => {
                let result = SettlementEngine::handle_fulfillment(
                    &mut lottery,
                    request_id,
                    random_value,
                    collaborators.payout_sink.as_mut(),
                );
                let _ = reply.send(result);
            }
            Command::ResetStalledRound { reply } => {
                let _ = reply.send(lottery.reset_stalled_round());
            }
            Command::Status { reply } => {
                let _ = reply.send(RoundStatus {
                    round_id: lottery.round_id(),
                    phase: lottery.current_phase(),
                    entry_fee: lottery.entry_fee(),
                    pot: lottery.current_pot(),
                    entries: lottery.ledger().entries().to_vec(),
                    pending_request: lottery.pending_request().map(|pending| pending.request_id),
                    recent_winner: lottery.recent_winner().copied(),
                });
            }
        }
    }
    msg!("Lottery mailbox closed at round {}", lottery.round_id());
    lottery
}

impl LotteryHandle {
    pub async fn open_round(&self, usd_fee: u64) -> Result<u64, LotteryError> {
        self.request(|reply| Command::OpenRound { usd_fee, reply })
            .await
    }

    pub async fn enter(&self, participant: Pubkey, paid_amount: u64) -> Result<(), LotteryError> {
        self.request(|reply| Command::Enter {
            participant,
            paid_amount,
            reply,
        })
        .await
    }

    pub async fn close_round(&self) -> Result<RequestId, LotteryError> {
        self.request(|reply| Command::CloseRound { reply }).await
    }

    /// Inbound oracle callback
    pub async fn fulfill_randomness(
        &self,
        request_id: RequestId,
        random_value: u64,
    ) -> Result<WinnerReceipt, LotteryError> {
        self.request(|reply| Command::Fulfill {
            request_id,
            random_value,
            reply,
        })
        .await
    }

    pub async fn reset_stalled_round(&self) -> Result<StalledRound, LotteryError> {
        self.request(|reply| Command::ResetStalledRound { reply })
            .await
    }

    pub async fn status(&self) -> Result<RoundStatus, LotteryError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Status { reply })
            .await
            .map_err(|_| LotteryError::ServiceStopped)?;
        response.await.map_err(|_| LotteryError::ServiceStopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, LotteryError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| LotteryError::ServiceStopped)?;
        response.await.map_err(|_| LotteryError::ServiceStopped)?
    }
}
