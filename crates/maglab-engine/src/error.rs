use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] maglab_db::DbError),

    #[error(transparent)]
    Harvest(#[from] maglab_harvest::HarvestError),

    #[error(transparent)]
    Outreach(#[from] maglab_outreach::OutreachError),

    #[error("profile has no usable profile URL")]
    MissingProfileUrl,

    #[error("{run_type} run aborted: all {count} monitors failed")]
    AllMonitorsFailed { run_type: String, count: usize },

    #[error("outreach push aborted: all {count} owner batches failed")]
    AllOwnersFailed { count: usize },
}
