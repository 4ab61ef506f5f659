//! IdGenerator port - TaskId の生成
//!
//! テスト容易性のために trait として抽象化しています。

use crate::domain::TaskId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は submit 時に TaskId を発行する
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の submit スレッドから呼ばれる）
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock の時刻を timestamp 部分に使うので、FixedClock と組み合わせると
/// timestamp が固定された ID を生成できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        TaskId::from(ulid)
    }
}
