use std::ops::RangeInclusive;

use crate::codec::Action;
use super::vid::Vid;

/// Frames showing `action` seen from `direction` (0-255, a full turn).
///
/// Actions the vid has no animation for fall back to `Stand`. Returns `None`
/// when the vid declares no directions or even `Stand` has no frames.
pub fn frame_range(vid: &Vid, action: Action, direction: u8) -> Option<RangeInclusive<usize>> {
    let lengths = vid.animation_lengths();
    let dirs = vid.directions_count as usize;
    if dirs == 0 {
        return None;
    }

    let mut index = action as usize;
    if lengths[index] == 0 {
        index = Action::Stand as usize;
    }
    let len = lengths[index] as usize;
    if len == 0 {
        return None;
    }

    let before: usize = lengths[..index].iter().map(|&l| l as usize * dirs).sum();
    let round = (0xFF / dirs) / 2;
    let sector = ((direction as usize + round) & 0xFF) * dirs / 256;
    let first = before + sector * len;
    Some(first..=first + len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryReader;
    use crate::resources::vid::tests::{encode_vid, TestGraphics};

    fn vid(dirs: u8, lengths: &[(Action, u8)]) -> Vid {
        let bytes = encode_vid("Unit", 2, TestGraphics::SharedFrom(1));
        let mut vid = Vid::read(&mut BinaryReader::new(&bytes)).unwrap();
        vid.directions_count = dirs;
        vid.action_table = [0; 144];
        for &(action, len) in lengths {
            vid.action_table[action as usize] = len;
        }
        vid
    }

    #[test]
    fn test_stand_facing_each_direction() {
        let v = vid(8, &[(Action::Stand, 2)]);
        assert_eq!(frame_range(&v, Action::Stand, 0), Some(0..=1));
        // 0x20 rounds into the second sector of eight, 0xF8 wraps back to the first.
        assert_eq!(frame_range(&v, Action::Stand, 0x20), Some(2..=3));
        assert_eq!(frame_range(&v, Action::Stand, 0xF8), Some(0..=1));
    }

    #[test]
    fn test_later_action_skips_earlier_blocks() {
        let v = vid(4, &[(Action::Stand, 1), (Action::Build, 3), (Action::Go, 5)]);
        // stand 1*4 + build 3*4 = 16, then direction 0x40 is sector 1
        assert_eq!(frame_range(&v, Action::Go, 0x40), Some(21..=25));
    }

    #[test]
    fn test_missing_action_falls_back_to_stand() {
        let v = vid(1, &[(Action::Stand, 4)]);
        assert_eq!(frame_range(&v, Action::Death, 77), Some(0..=3));
        assert_eq!(frame_range(&vid(0, &[(Action::Stand, 4)]), Action::Stand, 0), None);
        assert_eq!(frame_range(&vid(4, &[]), Action::Go, 0), None);
    }
}
