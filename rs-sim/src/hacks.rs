use rs_utils::HacksSettings;
use tracing::debug;

/// Movement capabilities granted by the server, the player's own hacks
/// options, and the movement modes currently active.
#[derive(Clone, Debug)]
pub struct HacksComp {
    pub is_op: bool,
    pub can_any_hacks: bool,
    pub can_use_third_person: bool,
    pub can_speed: bool,
    pub can_fly: bool,
    pub can_respawn: bool,
    pub can_noclip: bool,
    pub can_pushback_blocks: bool,
    pub can_see_all_names: bool,
    pub can_double_jump: bool,
    pub can_be_pushed: bool,
    pub base_hor_speed: f32,
    pub max_speed_multiplier: f32,
    pub max_jumps: i32,
    /// Server-imposed jump height from `jumpheight=`, if any.
    pub jump_height_flag: Option<f32>,

    pub enabled: bool,
    pub speed_multiplier: f32,
    pub pushback_placing: bool,
    pub noclip_slide: bool,
    pub wom_style_hacks: bool,
    pub full_block_step: bool,

    pub flying: bool,
    pub noclip: bool,
    pub speeding: bool,
    pub half_speeding: bool,
    pub flying_up: bool,
    pub flying_down: bool,
    /// `flying || noclip`, refreshed each tick.
    pub floating: bool,

    hacks_flags: String,
}

impl Default for HacksComp {
    fn default() -> Self {
        Self {
            is_op: false,
            can_any_hacks: true,
            can_use_third_person: true,
            can_speed: true,
            can_fly: true,
            can_respawn: true,
            can_noclip: true,
            can_pushback_blocks: true,
            can_see_all_names: true,
            can_double_jump: true,
            can_be_pushed: true,
            base_hor_speed: 1.0,
            max_speed_multiplier: 1.0,
            max_jumps: 1,
            jump_height_flag: None,
            enabled: true,
            speed_multiplier: 10.0,
            pushback_placing: false,
            noclip_slide: false,
            wom_style_hacks: false,
            full_block_step: false,
            flying: false,
            noclip: false,
            speeding: false,
            half_speeding: false,
            flying_up: false,
            flying_down: false,
            floating: false,
            hacks_flags: String::new(),
        }
    }
}

impl HacksComp {
    /// Applies the user's hacks options. Classic mode turns hacks off and
    /// ignores the remaining options.
    pub fn apply_settings(&mut self, settings: &HacksSettings, classic_mode: bool) {
        self.enabled = !classic_mode && settings.enabled;
        if classic_mode {
            return;
        }
        self.speed_multiplier = settings.speed_multiplier;
        self.pushback_placing = settings.pushback_placing;
        self.noclip_slide = settings.noclip_slide;
        self.wom_style_hacks = settings.wom_style_hacks;
        self.full_block_step = settings.full_block_step;
    }

    fn set_all(&mut self, allowed: bool) {
        self.can_any_hacks = allowed;
        self.can_use_third_person = allowed;
        self.can_speed = allowed;
        self.can_fly = allowed;
        self.can_respawn = allowed;
        self.can_noclip = allowed;
        self.can_pushback_blocks = allowed;
        self.can_see_all_names = allowed;
    }

    /// Server user type; 100 and above marks an operator.
    pub fn set_user_type(&mut self, user_type: u8) {
        self.is_op = (100..=127).contains(&user_type);
        self.recheck_flags();
    }

    /// Re-derives capabilities from the server name + MOTD text, e.g.
    /// `"-fly +speed jumps=3 horspeed=2"`.
    pub fn update_from_motd(&mut self, server_name: &str, motd: &str) {
        self.hacks_flags = format!("{server_name} {motd}").to_ascii_lowercase();
        self.recheck_flags();
    }

    fn recheck_flags(&mut self) {
        let allowed = !self.has_flag("-hax");
        self.set_all(allowed);
        self.can_be_pushed = true;

        if let Some(allowed) = self.flag_toggle("fly") {
            self.can_fly = allowed;
        }
        if let Some(allowed) = self.flag_toggle("noclip") {
            self.can_noclip = allowed;
        }
        if let Some(allowed) = self.flag_toggle("speed") {
            self.can_speed = allowed;
        }
        if let Some(allowed) = self.flag_toggle("respawn") {
            self.can_respawn = allowed;
        }
        if let Some(allowed) = self.flag_toggle("push") {
            self.can_be_pushed = allowed;
        }

        if self.is_op {
            if self.has_flag("+ophax") {
                self.set_all(true);
            }
            if self.has_flag("-ophax") {
                self.set_all(false);
            }
        }

        self.base_hor_speed = self.flag_value("horspeed=").unwrap_or(1.0);
        self.max_speed_multiplier = self.flag_value("maxspeed=").unwrap_or(1.0);
        self.max_jumps = self.flag_value("jumps=").map_or(1, |v| v as i32);
        self.jump_height_flag = self.flag_value("jumpheight=");
        debug!(
            fly = self.can_fly,
            noclip = self.can_noclip,
            speed = self.can_speed,
            respawn = self.can_respawn,
            max_jumps = self.max_jumps,
            "hacks permissions updated"
        );
        self.check_consistency();
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.hacks_flags.split_whitespace().any(|word| word == flag)
    }

    /// `+name` wins over `-name` when both are present.
    fn flag_toggle(&self, name: &str) -> Option<bool> {
        if self.has_flag(&format!("+{name}")) {
            Some(true)
        } else if self.has_flag(&format!("-{name}")) {
            Some(false)
        } else {
            None
        }
    }

    /// Value of a `key=value` flag. Missing, unparsable and non-positive
    /// values all read as absent, except `jumps=0` which is honoured.
    fn flag_value(&self, key: &str) -> Option<f32> {
        let raw = self
            .hacks_flags
            .split_whitespace()
            .find_map(|word| word.strip_prefix(key))?;
        let value = raw.parse::<f32>().ok()?;
        if !value.is_finite() || value < 0.0 || (value == 0.0 && key != "jumps=") {
            return None;
        }
        Some(value)
    }

    /// Turns off any active mode the current permissions no longer allow.
    pub fn check_consistency(&mut self) {
        if !self.can_fly || !self.enabled {
            self.flying = false;
            self.flying_down = false;
            self.flying_up = false;
        }
        if !self.can_noclip || !self.enabled {
            self.noclip = false;
        }
        if !self.can_speed || !self.enabled {
            self.speeding = false;
            self.half_speeding = false;
        }
        self.can_double_jump = self.can_any_hacks && self.enabled && self.can_speed;
        self.can_see_all_names = self.can_any_hacks && self.can_see_all_names;
        self.floating = self.flying || self.noclip;
    }

    pub fn can_jump_higher(&self) -> bool {
        self.enabled && self.can_any_hacks && self.can_speed
    }
}
