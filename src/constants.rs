/// 无历史成绩时的中性先验（θ）
pub const NEUTRAL_PRIOR: f64 = 0.5;

/// 难度选择所用的最近成绩窗口大小
pub const DEFAULT_RECENT_WINDOW: usize = 5;

/// 判定答题“正确”的统一阈值，连胜与正确率统计共用
pub const CORRECT_THRESHOLD: f64 = 0.7;

/// 无法解析评分时采用的默认分数
pub const DEFAULT_SCORE: f64 = 0.5;

/// 文本生成调用的默认超时（毫秒）
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 30_000;

/// 会话锁表超过此数量时清理空闲条目
pub const SESSION_LOCK_PRUNE_THRESHOLD: usize = 1000;

/// 每小时毫秒数
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// 答题记录序号在键中的定长宽度，保证字典序即记录顺序
pub const ATTEMPT_SEQ_WIDTH: usize = 10;
