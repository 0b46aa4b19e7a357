use std::fmt;
use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

/// A fungible token symbol: a decimal precision and a small integer id.
/// Two built-in ids are reserved for the chain's native fungibles (see
/// `ledgerdb_admin::ChainConfig`); all others are assigned by `newfungible`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Symbol {
    pub precision: u8,
    pub id: u32,
}

impl Symbol {
    pub fn new(precision: u8, id: u32) -> Result<Self> {
        if precision > 18 {
            return Err(Error::kind(
                Kind::FungibleSymbolInvalid,
                format!("precision {precision} exceeds 18"),
            ));
        }
        if id == 0 {
            return Err(Error::kind(Kind::FungibleSymbolInvalid, "symbol id 0 is reserved"));
        }
        Ok(Symbol { precision, id })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{},{}", self.id, self.precision)
    }
}

ledgerdb_codec::codec_struct!(Symbol { precision: u8, id: u32 });

/// A signed, fixed-point quantity of a [`Symbol`]. `amount` is stored in
/// the symbol's smallest unit; arithmetic is checked, never wrapping,
/// since an overflow here is a billing- or transfer-affecting bug, not a
/// recoverable condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Asset {
    pub amount: i64,
    pub sym: Symbol,
}

impl Asset {
    pub fn new(amount: i64, sym: Symbol) -> Self {
        Asset { amount, sym }
    }

    pub fn zero(sym: Symbol) -> Self {
        Asset { amount: 0, sym }
    }

    fn check_same_symbol(&self, other: &Asset) -> Result<()> {
        if self.sym != other.sym {
            return Err(Error::kind(
                Kind::FungibleSymbolInvalid,
                format!("symbol mismatch: {} vs {}", self.sym, other.sym),
            ));
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Asset) -> Result<Asset> {
        self.check_same_symbol(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| Error::kind(Kind::MathOverflow, "asset addition overflowed"))?;
        Ok(Asset { amount, sym: self.sym })
    }

    pub fn checked_sub(&self, other: &Asset) -> Result<Asset> {
        self.check_same_symbol(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| Error::kind(Kind::MathOverflow, "asset subtraction overflowed"))?;
        Ok(Asset { amount, sym: self.sym })
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.sym.precision as u32;
        let scale = 10i64.pow(p);
        let whole = self.amount / scale;
        let frac = (self.amount % scale).abs();
        write!(f, "{whole}.{frac:0width$} {}", self.sym, width = p as usize)
    }
}

ledgerdb_codec::codec_struct!(Asset { amount: i64, sym: Symbol });

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::decode_from_slice;
    use test_log::test;

    #[test]
    fn symbol_rejects_zero_id() {
        assert!(Symbol::new(4, 0).is_err());
    }

    #[test]
    fn asset_arithmetic() {
        let sym = Symbol::new(4, 1).unwrap();
        let a = Asset::new(100, sym);
        let b = Asset::new(50, sym);
        assert_eq!(a.checked_sub(&b).unwrap().amount, 50);
        assert_eq!(a.checked_add(&b).unwrap().amount, 150);
    }

    #[test]
    fn asset_mismatched_symbol_errs() {
        let a = Asset::new(100, Symbol::new(4, 1).unwrap());
        let b = Asset::new(50, Symbol::new(4, 2).unwrap());
        assert!(a.checked_add(&b).is_err());
    }

    #[test]
    fn asset_overflow_errs() {
        let sym = Symbol::new(0, 1).unwrap();
        let a = Asset::new(i64::MAX, sym);
        let b = Asset::new(1, sym);
        assert!(a.checked_add(&b).is_err());
    }

    #[test]
    fn asset_roundtrip() {
        let a = Asset::new(-42, Symbol::new(2, 7).unwrap());
        let bytes = a.encode_to_vec();
        let back: Asset = decode_from_slice(&bytes).unwrap();
        assert_eq!(a, back);
    }
}
