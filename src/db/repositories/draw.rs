use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::domain::{DrawId, UserId};
use crate::entities::draws;

/// Stored draw, numbers still encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub id: DrawId,
    pub user_id: UserId,
    pub ciphertext: Vec<u8>,
    pub been_played: bool,
    pub matches_master: bool,
    pub master_draw: bool,
    pub lottery_round: i32,
    pub created_at: String,
}

impl From<draws::Model> for DrawRecord {
    fn from(model: draws::Model) -> Self {
        Self {
            id: DrawId::new(model.id),
            user_id: UserId::new(model.user_id),
            ciphertext: model.numbers,
            been_played: model.been_played,
            matches_master: model.matches_master,
            master_draw: model.master_draw,
            lottery_round: model.lottery_round,
            created_at: model.created_at,
        }
    }
}

/// Outcome of comparing one user draw during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub draw_id: DrawId,
    pub matches_master: bool,
}

pub struct DrawRepository {
    conn: DatabaseConnection,
}

impl DrawRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Stores an unplayed user draw.
    pub async fn insert_user_draw(&self, user_id: UserId, ciphertext: Vec<u8>) -> Result<DrawRecord> {
        let model = new_draw(user_id, ciphertext, false, 0)
            .insert(&self.conn)
            .await
            .context("Failed to insert draw")?;

        Ok(DrawRecord::from(model))
    }

    pub async fn unplayed_master(&self) -> Result<Option<DrawRecord>> {
        let draw = draws::Entity::find()
            .filter(draws::Column::MasterDraw.eq(true))
            .filter(draws::Column::BeenPlayed.eq(false))
            .order_by_desc(draws::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query unplayed master draw")?;

        Ok(draw.map(DrawRecord::from))
    }

    /// Stores a new master draw for the round after the previous master's
    /// (round 1 if there was none) and deletes every earlier master draw.
    ///
    /// The insert runs first so the transaction holds the SQLite write lock
    /// before the previous round is read; concurrent callers are serialized
    /// and each gets its own round.
    pub async fn replace_master(&self, owner: UserId, ciphertext: Vec<u8>) -> Result<DrawRecord> {
        let txn = self.conn.begin().await?;

        let inserted = new_draw(owner, ciphertext, true, 0)
            .insert(&txn)
            .await
            .context("Failed to insert master draw")?;

        let previous = draws::Entity::find()
            .filter(draws::Column::MasterDraw.eq(true))
            .filter(draws::Column::Id.ne(inserted.id))
            .order_by_desc(draws::Column::LotteryRound)
            .one(&txn)
            .await
            .context("Failed to query previous master draw")?;
        let lottery_round = previous.map_or(1, |master| master.lottery_round + 1);

        draws::Entity::delete_many()
            .filter(draws::Column::MasterDraw.eq(true))
            .filter(draws::Column::Id.ne(inserted.id))
            .exec(&txn)
            .await
            .context("Failed to delete superseded master draw")?;

        let mut master: draws::ActiveModel = inserted.into();
        master.lottery_round = Set(lottery_round);
        let model = master
            .update(&txn)
            .await
            .context("Failed to stamp master draw round")?;

        txn.commit().await?;

        Ok(DrawRecord::from(model))
    }

    pub async fn unplayed_user_draws(&self) -> Result<Vec<DrawRecord>> {
        let draws = draws::Entity::find()
            .filter(draws::Column::MasterDraw.eq(false))
            .filter(draws::Column::BeenPlayed.eq(false))
            .order_by_asc(draws::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query unplayed user draws")?;

        Ok(draws.into_iter().map(DrawRecord::from).collect())
    }

    /// A user's own submissions filtered by played state.
    pub async fn for_user(&self, user_id: UserId, played: bool) -> Result<Vec<DrawRecord>> {
        let draws = draws::Entity::find()
            .filter(draws::Column::UserId.eq(user_id.value()))
            .filter(draws::Column::MasterDraw.eq(false))
            .filter(draws::Column::BeenPlayed.eq(played))
            .order_by_asc(draws::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query draws for user")?;

        Ok(draws.into_iter().map(DrawRecord::from).collect())
    }

    /// Marks the master and every compared user draw as played, stamping the
    /// round. Either everything is written or nothing is.
    pub async fn settle(
        &self,
        master_id: DrawId,
        lottery_round: i32,
        outcomes: &[DrawOutcome],
    ) -> Result<()> {
        let txn = self.conn.begin().await?;

        let master = draws::Entity::find_by_id(master_id.value())
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Master draw {master_id} disappeared"))?;

        if master.been_played {
            anyhow::bail!("Master draw {master_id} was already played");
        }

        let mut master: draws::ActiveModel = master.into();
        master.been_played = Set(true);
        master.update(&txn).await?;

        for outcome in outcomes {
            let draw = draws::ActiveModel {
                id: Set(outcome.draw_id.value()),
                been_played: Set(true),
                matches_master: Set(outcome.matches_master),
                lottery_round: Set(lottery_round),
                ..Default::default()
            };

            draw.update(&txn)
                .await
                .with_context(|| format!("Failed to settle draw {}", outcome.draw_id))?;
        }

        txn.commit().await?;
        Ok(())
    }
}

fn new_draw(
    user_id: UserId,
    ciphertext: Vec<u8>,
    master_draw: bool,
    lottery_round: i32,
) -> draws::ActiveModel {
    draws::ActiveModel {
        user_id: Set(user_id.value()),
        numbers: Set(ciphertext),
        been_played: Set(false),
        matches_master: Set(false),
        master_draw: Set(master_draw),
        lottery_round: Set(lottery_round),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
}
