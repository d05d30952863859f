pub mod aggregator;
pub mod events;
pub mod producer;
pub mod round;
pub mod view_state;

pub use aggregator::{AggregatorState, VoteAccepted, VoteAggregator, VoteRejected};
pub use events::{ConsensusCommand, ConsensusEvent};
pub use producer::{BlockProducer, BuilderError, PayloadBuilder, ProducerError};
pub use round::ViewTask;
pub use view_state::{select_leader, LeaderSchedule, ViewState, ViewStateError};
