pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;
}

macro_rules! impl_get_bit {
    ($($t:ty),+) => {
        $(
            impl GetBit for $t {
                #[inline]
                fn bit(self, i: u8) -> bool {
                    debug_assert!(i < (<$t>::BITS as u8));
                    self & (1 << i) != 0
                }
            }
        )+
    };
}

impl_get_bit!(u8, u16);

pub trait U16Ext {
    fn lsb(self) -> u8;

    fn msb(self) -> u8;
}

impl U16Ext for u16 {
    #[inline(always)]
    fn lsb(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    fn msb(self) -> u8 {
        (self >> 8) as u8
    }
}
