use cosmwasm_std::BlockInfo;

const SECS_PER_BLOCK: i64 = 7;
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_BLOCK: i64 = SECS_PER_BLOCK * NANOS_PER_SECOND;

// Encapsulates simulated time jumps (i.e. moves time and block height together)
#[derive(Debug, Clone, Copy)]
pub enum TimeJump {
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Blocks(i64),
}

pub struct BlockInfoChange {
    pub height: i64,
    pub nanos: i64,
}

impl BlockInfoChange {
    pub fn from_nanos(nanos: i64) -> Self {
        // ceil away from 0 (i.e. the ceil of a negative should be "more negative")
        const fn signed_div_ceil(a: i64, b: i64) -> i64 {
            let sign = match (a >= 0, b >= 0) {
                (true, true) => 1,
                (false, false) => 1,
                (true, false) => -1,
                (false, true) => -1,
            };

            let a = a.unsigned_abs();
            let b = b.unsigned_abs();

            let d = a / b;
            let r = a % b;
            let res = if r > 0 && b > 0 { d + 1 } else { d };

            #[allow(clippy::as_conversions)]
            {
                res as i64 * sign
            }
        }
        Self {
            height: signed_div_ceil(nanos, NANOS_PER_BLOCK),
            nanos,
        }
    }

    pub(crate) fn from_time_jump(time_jump: TimeJump) -> Self {
        let nanos = match time_jump {
            TimeJump::Seconds(n) => n * NANOS_PER_SECOND,
            TimeJump::Minutes(n) => n * 60 * NANOS_PER_SECOND,
            TimeJump::Hours(n) => n * 60 * 60 * NANOS_PER_SECOND,
            TimeJump::Days(n) => n * 24 * 60 * 60 * NANOS_PER_SECOND,
            TimeJump::Blocks(n) => n * SECS_PER_BLOCK * NANOS_PER_SECOND,
        };

        Self::from_nanos(nanos)
    }

    pub fn apply(&self, block: &mut BlockInfo) {
        let height = i64::try_from(block.height)
            .expect("block height out of range")
            .checked_add(self.height)
            .expect("block height overflow");
        block.height = u64::try_from(height).expect("negative block height");

        let nanos = i64::try_from(block.time.nanos())
            .expect("block time out of range")
            .checked_add(self.nanos)
            .expect("block time overflow");
        block.time =
            cosmwasm_std::Timestamp::from_nanos(u64::try_from(nanos).expect("negative block time"));
    }
}
