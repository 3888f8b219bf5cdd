use std::{cmp, mem};

use serde::{Deserialize, Serialize};

/// Position key for list ordering: between any two distinct keys another key
/// can always be found, so a drag-and-drop move only ever rewrites the moved
/// item's key.
///
/// Keys compare bytewise, except that running out of bytes compares as the
/// imaginary value 127.5: an absent byte is greater than any byte `<= 0x7f`
/// and smaller than any byte `>= 0x80`. That leaves room on both sides of
/// the empty key, which is what makes the midpoint always exist.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SortKey(Vec<u8>);

impl SortKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn cmp_bytes(a: &[u8], b: &[u8]) -> cmp::Ordering {
        let mut a = a.iter().copied();
        let mut b = b.iter().copied();

        loop {
            match (a.next(), b.next()) {
                (None, None) => return cmp::Ordering::Equal,
                (None, Some(b)) => {
                    return if 0x80 <= b {
                        cmp::Ordering::Less
                    } else {
                        cmp::Ordering::Greater
                    }
                }
                (Some(a), None) => {
                    return if a < 0x80 {
                        cmp::Ordering::Less
                    } else {
                        cmp::Ordering::Greater
                    }
                }
                (Some(a), Some(b)) => match a.cmp(&b) {
                    cmp::Ordering::Equal => continue,
                    unequal => return unequal,
                },
            }
        }
    }
}

impl From<Vec<u8>> for SortKey {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Self::cmp_bytes(&self.0, &other.0)
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl SortKey {
    /// Key ordering before every existing key, given the current first key.
    pub fn before_first(existing_first: Option<&SortKey>) -> SortKey {
        let Some(existing_first) = existing_first else {
            return SortKey::from(vec![]);
        };

        let mut key = vec![];

        for byte in existing_first.0.iter().copied() {
            if byte == 0x00 {
                // can't go below 0x00, extend and try the next position
                key.push(byte);
            } else {
                key.push(byte / 2);
                return SortKey::from(key);
            }
        }

        // first key was all zeros; anything < 0x80 appended sorts before it
        key.push(0x40);

        SortKey::from(key)
    }

    /// Key ordering after every existing key, given the current last key.
    pub fn after_last(existing_last: Option<&SortKey>) -> SortKey {
        let Some(existing_last) = existing_last else {
            return SortKey::from(vec![]);
        };

        let mut key = vec![];

        for byte in existing_last.0.iter().copied() {
            if byte == 0xff {
                key.push(byte);
            } else {
                key.push(0x80 + byte / 2);
                return SortKey::from(key);
            }
        }

        key.push(0xa0);

        SortKey::from(key)
    }

    /// Key strictly between `a` and `b` when they differ; equal to both when
    /// they are equal. The arguments may come in either order.
    pub fn midpoint(a: &SortKey, b: &SortKey) -> SortKey {
        let mut lo_i = a.0.iter().copied();
        let mut hi_i = b.0.iter().copied();

        let mut key = vec![];

        'outer: loop {
            let (lo, hi) = (lo_i.next(), hi_i.next());

            // All bytes so far were equal, so if the sides turn out to be in
            // descending order we can swap the iterators here and continue as
            // if they had been passed low-first.
            let (lo, hi) = match (lo, hi) {
                (Some(lo), Some(hi)) if hi < lo => {
                    mem::swap(&mut lo_i, &mut hi_i);
                    (Some(hi), Some(lo))
                }
                (Some(lo), None) if 0x80 <= lo => {
                    mem::swap(&mut lo_i, &mut hi_i);
                    (None, Some(lo))
                }
                (None, Some(hi)) if hi < 0x80 => {
                    mem::swap(&mut lo_i, &mut hi_i);
                    (Some(hi), None)
                }
                pair => pair,
            };

            match (lo, hi) {
                (Some(lo), Some(hi)) if lo == hi => {
                    key.push(lo);
                }
                (Some(lo), Some(hi)) => {
                    debug_assert_ne!(lo, hi);
                    let mid = ((lo as u16 + hi as u16) / 2) as u8;
                    if mid != lo && mid != hi {
                        key.push(mid);
                        break;
                    }

                    // adjacent bytes: the midpoint depends on what follows
                    match (lo_i.next(), hi_i.next()) {
                        (Some(0xff), Some(0x00)) => {
                            // stay on the low side to avoid backtracking
                            key.push(lo);
                            key.push(0xff);
                            for lo in lo_i.by_ref() {
                                if lo == 0xff {
                                    key.push(0xff);
                                } else {
                                    // lo:  0x01 0xff 0x10
                                    // mid: 0x01 0xff 0x85
                                    // hi:  0x02 0x00
                                    key.push(lo / 2 + 0x80);
                                    break 'outer;
                                }
                            }
                            // lo:  0x01 0xff
                            // mid: 0x01 0xff 0xa0
                            // hi:  0x02 0x00
                            key.push(0xa0);
                            break;
                        }
                        (Some(0xff), Some(hi2)) => {
                            // lo:  0x01 0xff
                            // mid: 0x02 0x40
                            // hi:  0x02 0x80
                            key.push(hi);
                            key.push(hi2 / 2);
                            break;
                        }
                        (Some(lo2), Some(0x00)) => {
                            // lo:  0x01 0x80
                            // mid: 0x01 0xc0
                            // hi:  0x02 0x00
                            key.push(lo);
                            key.push(lo2 / 2 + 0x80);
                            break;
                        }
                        (None, Some(0x00)) => {
                            // lo:  0x01
                            // mid: 0x01 0xa0
                            // hi:  0x02 0x00
                            key.push(lo);
                            key.push(0xa0);
                            break;
                        }
                        (Some(0xff), None) => {
                            // lo:  0x01 0xff
                            // mid: 0x02 0x40
                            // hi:  0x02
                            key.push(hi);
                            key.push(0x40);
                            break;
                        }
                        (None, None) => {
                            // lo:  0x01
                            // mid: 0x02 0x00
                            // hi:  0x02
                            key.push(hi);
                            key.push(0x00);
                            break;
                        }
                        (Some(lo2), None) => {
                            // lo:  0x01 0x80
                            // mid: 0x01 0xc0
                            // hi:  0x02
                            key.push(lo);
                            key.push(lo2 / 2 + 0x80);
                            break;
                        }
                        (None, Some(hi2)) => {
                            // lo:  0x01
                            // mid: 0x02 <hi2/2>
                            // hi:  0x02 0x80
                            key.push(hi);
                            key.push(hi2 / 2);
                            break;
                        }
                        (Some(lo2), Some(hi2)) => {
                            debug_assert!(lo2 != 0xff);
                            debug_assert!(hi2 != 0x00);
                            if lo2 < 0x80 {
                                key.push(lo);
                                key.push(lo2 / 2 + 0x80);
                            } else if 0x80 <= hi2 {
                                key.push(hi);
                                key.push(hi2 / 2);
                            } else {
                                // TODO: not the shortest possible key
                                key.push(lo);
                                key.push(0xff);
                            }
                            break;
                        }
                    }
                }
                (Some(lo), None) => {
                    debug_assert!(lo < 0x80);
                    if lo == 0x7f {
                        // 0x7f is right below the implicit 127.5 end marker,
                        // so the midpoint has to keep digging
                        key.push(lo);
                        loop {
                            match lo_i.next() {
                                Some(0xff) => {
                                    key.push(0xff);
                                }
                                Some(lo) => {
                                    // lo:  0x7f 0xfe
                                    // mid: 0x7f 0xff
                                    key.push(lo / 2 + 0x80);
                                    break 'outer;
                                }
                                None => {
                                    // lo:  0x7f
                                    // mid: 0x7f 0xa0
                                    key.push(0xa0);
                                    break 'outer;
                                }
                            }
                        }
                    } else {
                        // lo:  0x40
                        // mid: 0x60
                        key.push(lo / 2 + 0x40);
                        break;
                    }
                }
                (None, Some(hi)) => {
                    debug_assert!(0x80 <= hi);

                    if hi == 0x80 {
                        // mirror image of the 0x7f case above
                        key.push(hi);

                        loop {
                            match hi_i.next() {
                                Some(0x00) => {
                                    key.push(0x00);
                                }
                                Some(hi) => {
                                    // mid: 0x80 0x00 <hi/2>
                                    // hi:  0x80 0x00 ...
                                    key.push(hi / 2);
                                    break 'outer;
                                }
                                None => {
                                    // mid: 0x80 0x40
                                    // hi:  0x80
                                    key.push(0x40);
                                    break 'outer;
                                }
                            }
                        }
                    } else {
                        // mid: 0xa0
                        // hi:  0xc0
                        key.push(hi / 2 + 0x40);
                        break;
                    }
                }
                (None, None) => {
                    // equal inputs, equal midpoint
                    break;
                }
            }
        }

        SortKey(key)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn end_of_key_compares_as_half() {
        for (a, b, expected) in [
            (vec![], vec![], cmp::Ordering::Equal),
            (vec![0x00], vec![0x00], cmp::Ordering::Equal),
            (vec![0x7f], vec![0x7f], cmp::Ordering::Equal),
            (vec![0x80], vec![0x80], cmp::Ordering::Equal),
            (vec![0xff], vec![0xff], cmp::Ordering::Equal),
            (vec![0x00], vec![], cmp::Ordering::Less),
            (vec![0x7f], vec![], cmp::Ordering::Less),
            (vec![0x80], vec![], cmp::Ordering::Greater),
            (vec![0xff], vec![], cmp::Ordering::Greater),
            (vec![0x10, 0x00], vec![0x10], cmp::Ordering::Less),
            (vec![0x10, 0x7f], vec![0x10], cmp::Ordering::Less),
            (vec![0x10, 0x80], vec![0x10], cmp::Ordering::Greater),
            (vec![0x10, 0xff], vec![0x10], cmp::Ordering::Greater),
            (vec![0x00], vec![0x00, 122], cmp::Ordering::Greater),
            (vec![228, 1], vec![227, 128], cmp::Ordering::Greater),
        ] {
            assert_eq!(SortKey::from(a).cmp(&SortKey::from(b)), expected);
        }
    }

    #[test]
    fn before_first_sorts_in_front() {
        let first = SortKey::from(vec![]);
        let newer = SortKey::before_first(Some(&first));
        assert!(newer < first);

        let even_newer = SortKey::before_first(Some(&newer));
        assert!(even_newer < newer);
    }

    #[test]
    fn after_last_sorts_behind() {
        let last = SortKey::from(vec![]);
        let later = SortKey::after_last(Some(&last));
        assert!(last < later);

        let even_later = SortKey::after_last(Some(&later));
        assert!(later < even_later);
    }

    fn midpoint_is_strictly_between(a: SortKey, b: SortKey) -> bool {
        let mid = SortKey::midpoint(&a, &b);
        match a.cmp(&b) {
            cmp::Ordering::Equal => mid == a && mid == b,
            cmp::Ordering::Less => a < mid && mid < b,
            cmp::Ordering::Greater => b < mid && mid < a,
        }
    }

    #[quickcheck]
    fn midpoint_is_strictly_between_quickcheck(a: Vec<u8>, b: Vec<u8>) {
        assert!(
            midpoint_is_strictly_between(SortKey::from(a.clone()), SortKey::from(b.clone())),
            "{a:?}, {b:?}"
        );
    }

    #[test]
    fn midpoint_is_strictly_between_manual() {
        for (a, b) in [
            (vec![], vec![]),
            (vec![0x00], vec![0x00, 0x00]),
            (vec![0x00], vec![0x00, 0x00, 0x00]),
            (vec![0x80], vec![0x80]),
            (vec![0x00], vec![0x00]),
            (vec![0x00], vec![]),
            (vec![0x00], vec![0xff]),
            (vec![0x01, 0x0a], vec![0x02, 0xff]),
            (vec![0x01, 0x00], vec![0x02, 0x40]),
            (vec![0x01, 0xff], vec![0x02, 0x00]),
            (vec![0x01, 0xff, 0xff], vec![0x02, 0x00, 0x00]),
            (vec![0x01, 0xff], vec![0x02, 0x00, 0x00]),
            (vec![0x01, 0xff, 0xff], vec![0x02, 0x00]),
            (vec![0xff], vec![]),
            // regressions found by the quickcheck above
            (vec![0x00], vec![0x00, 122]),
            (vec![228, 1], vec![227, 128]),
            (vec![0x00, 127], vec![0]),
            (vec![252, 128], vec![253, 128]),
            (vec![0, 128], vec![1, 0]),
        ] {
            assert!(
                midpoint_is_strictly_between(SortKey::from(a.clone()), SortKey::from(b.clone())),
                "{a:?}, {b:?}"
            );
        }
    }
}
