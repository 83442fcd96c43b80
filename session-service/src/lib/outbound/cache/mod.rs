pub mod null;
pub mod redis;

pub use self::null::NullCache;
pub use self::redis::RedisCache;
