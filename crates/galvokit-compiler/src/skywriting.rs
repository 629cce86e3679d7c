//! SkyWriting timing switch
//!
//! With SkyWriting the scanner accelerates outside the marked path, so the
//! jump and polygon delays collapse to zero and the laser switching uses the
//! dedicated SkyWriting delays.

use galvokit_settings::SpeedProfile;

/// Delays applied to one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParams {
    pub jump_delay: u32,
    pub mark_delay: u32,
    pub polygon_delay: u32,
    pub laser_on_delay: f32,
    pub laser_off_delay: f32,
}

/// Timing for `profile` with SkyWriting on or off
pub fn resolve(profile: &SpeedProfile, skywriting_enabled: bool) -> TimingParams {
    if skywriting_enabled {
        TimingParams {
            jump_delay: 0,
            mark_delay: profile.mark_delay,
            polygon_delay: 0,
            laser_on_delay: profile.laser_on_delay_for_sky_writing,
            laser_off_delay: profile.laser_off_delay_for_sky_writing,
        }
    } else {
        TimingParams {
            jump_delay: profile.jump_delay,
            mark_delay: profile.mark_delay,
            polygon_delay: profile.polygon_delay,
            laser_on_delay: profile.laser_on_delay,
            laser_off_delay: profile.laser_off_delay,
        }
    }
}
