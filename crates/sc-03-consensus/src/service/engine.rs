//! # Shard Engine
//!
//! The per-node control loop. Each pass handles one epoch:
//!
//! ```text
//! Committee:  route ──→ mine E+1..=E+L ──→ committee round ──→ broadcast epoch block
//! Proposer:   await assignment ──→ mine E+1..=E+L ──→ merge transitions ──→ await epoch block
//!                              └──→ peer transitions ───┘
//! Observer:   await epoch block
//! ```
//!
//! Only the epoch block at exactly E+L+1, signed off by the committee of
//! the current mapping, is adopted.

use super::committee::run_committee_round;
use super::listeners::EngineInbox;
use super::miner::{await_assignment, mine_height};
use super::reconciliation::start_reconciliation;
use super::validation::validate_epoch_block;
use super::NodeContext;
use crate::domain::{
    ChainState, ConsensusError, ConsensusResult, EpochReport, Role, RoundOutcome,
    SlashingRegistry,
};
use crate::metrics;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sc_02_sharding::TransactionRouter;
use shared_bus::NodeEvent;
use shared_types::{
    short_hex, EpochBlock, NetworkMessage, Request, TxBatch, COMMITTEE_SHARD,
};
use tracing::{debug, info, trace, warn};

/// Owns the chain state of one node and drives it epoch by epoch.
pub struct ShardEngine {
    ctx: NodeContext,
    chain: ChainState,
    router: TransactionRouter,
    slashing: SlashingRegistry,
    inbox: EngineInbox,
    rng: StdRng,
}

impl ShardEngine {
    /// Start from `genesis`, persisting it as the last closed epoch block.
    pub fn new(ctx: NodeContext, genesis: EpochBlock, inbox: EngineInbox) -> ConsensusResult<Self> {
        ctx.config.validate().map_err(ConsensusError::Config)?;
        ctx.store.write_epoch_block(genesis.clone())?;
        ctx.store.replace_state(genesis.state.clone());

        let chain = ChainState::from_epoch_block(genesis, &ctx.address);
        let rng = match ctx.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            address = %short_hex(&ctx.address),
            role = ?chain.role,
            num_shards = chain.num_shards,
            "[sc-03] Shard engine initialised"
        );

        Ok(Self {
            ctx,
            chain,
            router: TransactionRouter::new(),
            slashing: SlashingRegistry::new(),
            inbox,
            rng,
        })
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn slashing(&self) -> &SlashingRegistry {
        &self.slashing
    }

    pub fn router(&self) -> &TransactionRouter {
        &self.router
    }

    /// Run epochs until an unrecoverable error.
    pub async fn run(mut self) -> ConsensusResult<()> {
        loop {
            let report = self.step_epoch().await?;
            info!(
                epoch_height = report.epoch_height,
                next_epoch_height = report.next_epoch_height,
                role = ?report.role,
                blocks_mined = report.blocks_mined,
                transitions_merged = report.transitions_merged,
                rounds_retried = report.rounds_retried,
                "[sc-03] Epoch complete"
            );
        }
    }

    /// Process the current epoch and enter the next one.
    pub async fn step_epoch(&mut self) -> ConsensusResult<EpochReport> {
        let epoch_height = self.chain.epoch_height();
        let role = self.chain.role;

        let mut report = EpochReport {
            epoch_height,
            next_epoch_height: epoch_height,
            role,
            shard_id: role.shard_id(),
            blocks_mined: 0,
            transitions_merged: 0,
            rounds_retried: 0,
        };

        let next = match role {
            Role::Committee => {
                let mut pool = self.route_assignments().await?;
                report.blocks_mined = self.mine_epoch(&mut pool).await?;
                let (next, retries) = self.close_epoch().await?;
                report.rounds_retried = retries;
                self.ctx
                    .transport
                    .broadcast(NetworkMessage::EpochBlock(next.clone()))
                    .await?;
                next
            }
            Role::Proposer(_) => {
                let mut pool =
                    await_assignment(&self.ctx, &self.chain, &mut self.inbox.assignments).await?;
                let pending = start_reconciliation(&self.ctx, &self.chain);
                report.blocks_mined = match self.mine_epoch(&mut pool).await {
                    Ok(mined) => mined,
                    Err(e) => {
                        if let Some(pending) = &pending {
                            pending.abort();
                        }
                        return Err(e);
                    }
                };
                if let Some(pending) = pending {
                    report.transitions_merged =
                        pending.merge_into(&self.ctx, &mut self.chain).await?;
                }
                self.await_epoch_block().await?
            }
            Role::Observer(_) => self.await_epoch_block().await?,
        };

        self.adopt(next).await?;
        report.next_epoch_height = self.chain.epoch_height();
        Ok(report)
    }

    /// Route the open pool for this epoch; returns the committee's own share.
    ///
    /// Transactions their senders cannot cover from the epoch balance stay
    /// open.
    async fn route_assignments(&mut self) -> ConsensusResult<TxBatch> {
        let epoch_height = self.chain.epoch_height();
        let open = self.ctx.store.open_transactions();
        let assignments = self.router.route_funded(
            &open,
            epoch_height,
            self.chain.num_shards,
            &self.chain.epoch_block.state,
        )?;

        let mut own = TxBatch::new();
        for assignment in assignments {
            self.ctx.store.put_assignment(assignment.clone());
            self.ctx
                .events
                .publish(NodeEvent::AssignmentIssued {
                    epoch_height,
                    shard_id: assignment.shard_id,
                    tx_count: assignment.transactions.len(),
                })
                .await;
            if assignment.shard_id == COMMITTEE_SHARD {
                own = assignment.transactions.clone();
            }
            self.ctx
                .transport
                .broadcast(NetworkMessage::Assignment(assignment))
                .await?;
        }
        Ok(own)
    }

    /// Mine every height of the epoch, retrying a height until it succeeds.
    async fn mine_epoch(&mut self, pool: &mut TxBatch) -> ConsensusResult<usize> {
        let mut mined = 0;
        for height in self.chain.epoch_heights(self.ctx.config.epoch_length) {
            loop {
                match mine_height(&self.ctx, &mut self.chain, pool, height).await {
                    Ok(_) => {
                        mined += 1;
                        break;
                    }
                    Err(e @ (ConsensusError::Round(_) | ConsensusError::Finalizer(_))) => {
                        warn!(height, error = %e, "[sc-03] Mining failed, retrying height");
                        tokio::time::sleep(self.ctx.config.round_retry_delay()).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(mined)
    }

    /// Repeat the committee round until it yields an epoch block.
    async fn close_epoch(&mut self) -> ConsensusResult<(EpochBlock, usize)> {
        let epoch_height = self.chain.epoch_height();
        let mut retries = 0;
        loop {
            match run_committee_round(&self.ctx, &self.chain, &mut self.rng).await {
                Ok(RoundOutcome::Closed(next)) => return Ok((next, retries)),
                Ok(RoundOutcome::CheatDetected(proofs)) => {
                    for proof in proofs {
                        self.ctx
                            .events
                            .publish(NodeEvent::CheatDetected {
                                height: proof.height,
                                shard_id: proof.shard_id,
                                mismatched_accounts: proof.mismatches.len(),
                            })
                            .await;
                        self.ctx
                            .store
                            .remove_transition(proof.height, proof.shard_id);
                        self.slashing.record(proof);
                    }
                }
                Err(ConsensusError::Round(e)) => {
                    warn!(epoch_height, error = %e, "[sc-03] Committee round aborted");
                    self.ctx
                        .events
                        .publish(NodeEvent::RoundAborted {
                            epoch_height,
                            reason: e.to_string(),
                        })
                        .await;
                    self.ctx.store.remove_block(e.height(), e.shard_id());
                }
                Err(e) => return Err(e),
            }
            retries += 1;
            tokio::time::sleep(self.ctx.config.round_retry_delay()).await;
        }
    }

    /// Wait for the epoch block that closes the current epoch.
    ///
    /// Anything failing [`validate_epoch_block`] is dropped; after a quiet
    /// timeout the block is requested from peers.
    async fn await_epoch_block(&mut self) -> ConsensusResult<EpochBlock> {
        let target = self.chain.epoch_height() + self.ctx.config.epoch_length + 1;
        let timeout = self.ctx.config.epoch_request_timeout();
        loop {
            match tokio::time::timeout(timeout, self.inbox.epoch_blocks.recv()).await {
                Ok(Some(older)) if older.height < target => {
                    trace!(height = older.height, target, "[sc-03] Ignoring older epoch block");
                }
                Ok(Some(epoch_block)) => {
                    if self.accepts(&epoch_block) {
                        return Ok(epoch_block);
                    }
                }
                Ok(None) => return Err(ConsensusError::ChannelClosed("epoch block")),
                Err(_) => {
                    metrics::record_request_timeout("epoch_block");
                    debug!(target, "[sc-03] Epoch block wait timed out");
                    let request = Request::epoch_block(target);
                    if let Some(NetworkMessage::EpochBlock(epoch_block)) =
                        self.ctx.transport.request(request, timeout).await?
                    {
                        if self.accepts(&epoch_block) {
                            return Ok(epoch_block);
                        }
                    }
                }
            }
        }
    }

    fn accepts(&self, epoch_block: &EpochBlock) -> bool {
        match validate_epoch_block(&self.chain, self.ctx.config.epoch_length, epoch_block) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    height = epoch_block.height,
                    hash = %short_hex(&epoch_block.hash),
                    error = %e,
                    "[sc-03] Rejected epoch block"
                );
                false
            }
        }
    }

    /// Close the transactions of every stashed block of the ending epoch.
    fn close_included(&self) {
        for height in self.chain.epoch_heights(self.ctx.config.epoch_length) {
            for shard_id in 1..=self.chain.num_shards {
                if let Some(block) = self.ctx.store.block(height, shard_id) {
                    self.ctx.store.close_transactions(&block.transactions.hashes());
                }
            }
        }
    }

    async fn adopt(&mut self, epoch_block: EpochBlock) -> ConsensusResult<()> {
        self.close_included();
        self.ctx.store.write_epoch_block(epoch_block.clone())?;
        self.ctx.store.replace_state(epoch_block.state.clone());
        self.chain.enter_epoch(epoch_block, &self.ctx.address);

        self.ctx
            .events
            .publish(NodeEvent::EpochAdvanced {
                height: self.chain.epoch_height(),
                num_shards: self.chain.num_shards,
                shard_id: self.chain.shard_id(),
            })
            .await;
        info!(
            height = self.chain.epoch_height(),
            num_shards = self.chain.num_shards,
            role = ?self.chain.role,
            "[sc-03] Entered epoch"
        );
        Ok(())
    }
}
