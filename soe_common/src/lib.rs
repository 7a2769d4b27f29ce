mod money;

pub mod op;

pub use money::{Money, MoneyConversionError, STORE_CURRENCY_CODE, STORE_CURRENCY_CODE_LOWER};
