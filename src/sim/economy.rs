//! Light/dark energy economy
//!
//! Two pools in [0, max_energy]. Spending clamps at zero, gains clamp at max;
//! nothing here ever fails.

use crate::config::EnergyConfig;
use crate::consts::DEPLETED_EPSILON;
use crate::{Element, OrbKind};

/// Lateral move direction; each side is paid for by one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Costs dark energy
    Left,
    /// Costs light energy
    Right,
}

/// Pool levels normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyLevels {
    pub light01: f32,
    pub dark01: f32,
}

#[derive(Debug, Clone)]
pub struct ResourceEconomy {
    cfg: EnergyConfig,
    light: f32,
    dark: f32,
}

impl ResourceEconomy {
    /// Both pools start full
    pub fn new(cfg: EnergyConfig) -> Self {
        let max = cfg.max_energy;
        Self {
            cfg,
            light: max,
            dark: max,
        }
    }

    pub fn light(&self) -> f32 {
        self.light
    }

    pub fn dark(&self) -> f32 {
        self.dark
    }

    pub fn max_energy(&self) -> f32 {
        self.cfg.max_energy
    }

    pub fn get(&self, element: Element) -> f32 {
        match element {
            Element::Light => self.light,
            Element::Dark => self.dark,
        }
    }

    pub fn levels(&self) -> EnergyLevels {
        EnergyLevels {
            light01: (self.light / self.cfg.max_energy).clamp(0.0, 1.0),
            dark01: (self.dark / self.cfg.max_energy).clamp(0.0, 1.0),
        }
    }

    pub fn is_light_depleted(&self) -> bool {
        self.light <= DEPLETED_EPSILON
    }

    pub fn is_dark_depleted(&self) -> bool {
        self.dark <= DEPLETED_EPSILON
    }

    /// Refill both pools (run restart)
    pub fn reset(&mut self) {
        self.light = self.cfg.max_energy;
        self.dark = self.cfg.max_energy;
    }

    /// Set both pools (revive), clamped to range
    pub fn restore(&mut self, light: f32, dark: f32) {
        self.light = self.clamp(light);
        self.dark = self.clamp(dark);
    }

    /// Passive drain while flying
    pub fn drain_idle(&mut self, dt: f32) {
        let drain = self.cfg.idle_drain_per_second * dt.max(0.0);
        self.light = self.clamp(self.light - drain);
        self.dark = self.clamp(self.dark - drain);
    }

    /// Lane change cost: right spends light, left spends dark
    pub fn spend_move(&mut self, direction: MoveDirection) {
        let cost = self.cfg.move_drain;
        match direction {
            MoveDirection::Right => self.light = self.clamp(self.light - cost),
            MoveDirection::Left => self.dark = self.clamp(self.dark - cost),
        }
    }

    pub fn can_attack(&self, element: Element) -> bool {
        self.get(element) >= self.cfg.attack_drain
    }

    /// Unconditional; callers check `can_attack` and a target first
    pub fn spend_attack(&mut self, element: Element) {
        let cost = self.cfg.attack_drain;
        match element {
            Element::Light => self.light = self.clamp(self.light - cost),
            Element::Dark => self.dark = self.clamp(self.dark - cost),
        }
    }

    pub fn add_orb(&mut self, kind: OrbKind) {
        match kind {
            OrbKind::Light => self.light = self.clamp(self.light + self.cfg.orb_amount),
            OrbKind::Dark => self.dark = self.clamp(self.dark + self.cfg.orb_amount),
            OrbKind::Dual => {
                self.light = self.clamp(self.light + self.cfg.dual_orb_amount);
                self.dark = self.clamp(self.dark + self.cfg.dual_orb_amount);
            }
        }
    }

    /// Lateral speed factor: penalized only when exactly one pool is empty
    pub fn move_speed_factor(&self) -> f32 {
        if self.is_light_depleted() ^ self.is_dark_depleted() {
            self.cfg.depleted_move_factor
        } else {
            1.0
        }
    }

    #[inline]
    fn clamp(&self, v: f32) -> f32 {
        v.clamp(0.0, self.cfg.max_energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn economy() -> ResourceEconomy {
        ResourceEconomy::new(EnergyConfig::default())
    }

    #[test]
    fn test_starts_full() {
        let e = economy();
        assert_eq!(e.light(), 100.0);
        assert_eq!(e.dark(), 100.0);
        assert_eq!(e.levels(), EnergyLevels { light01: 1.0, dark01: 1.0 });
    }

    #[test]
    fn test_move_direction_binding() {
        let mut e = economy();
        e.spend_move(MoveDirection::Right);
        assert_eq!(e.light(), 97.0);
        assert_eq!(e.dark(), 100.0);
        e.spend_move(MoveDirection::Left);
        assert_eq!(e.dark(), 97.0);
    }

    #[test]
    fn test_overspend_clamps_to_zero() {
        let mut e = economy();
        e.restore(5.0, 5.0);
        assert!(!e.can_attack(Element::Light));
        e.spend_attack(Element::Light);
        assert_eq!(e.light(), 0.0);
        e.drain_idle(1000.0);
        assert_eq!(e.dark(), 0.0);
    }

    #[test]
    fn test_can_attack_threshold_inclusive() {
        let mut e = economy();
        e.restore(8.0, 7.99);
        assert!(e.can_attack(Element::Light));
        assert!(!e.can_attack(Element::Dark));
    }

    #[test]
    fn test_orb_gain_caps_at_max() {
        let mut e = economy();
        e.restore(95.0, 50.0);
        e.add_orb(OrbKind::Light);
        assert_eq!(e.light(), 100.0);
        e.add_orb(OrbKind::Dual);
        assert_eq!(e.light(), 100.0);
        assert_eq!(e.dark(), 60.0);
        e.add_orb(OrbKind::Dark);
        assert_eq!(e.dark(), 75.0);
    }

    #[test]
    fn test_move_penalty_only_when_one_side_empty() {
        let mut e = economy();
        assert_eq!(e.move_speed_factor(), 1.0);
        e.restore(0.0, 50.0);
        assert_eq!(e.move_speed_factor(), 0.89);
        e.restore(50.0, 0.0);
        assert_eq!(e.move_speed_factor(), 0.89);
        e.restore(0.0, 0.0);
        assert_eq!(e.move_speed_factor(), 1.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Drain(f32),
        Move(bool),
        Attack(bool),
        Orb(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..50.0).prop_map(Op::Drain),
            any::<bool>().prop_map(Op::Move),
            any::<bool>().prop_map(Op::Attack),
            (0u8..3).prop_map(Op::Orb),
        ]
    }

    proptest! {
        #[test]
        fn pools_stay_in_range(ops in prop::collection::vec(op(), 0..200)) {
            let mut e = economy();
            for op in ops {
                match op {
                    Op::Drain(dt) => e.drain_idle(dt),
                    Op::Move(right) => e.spend_move(if right { MoveDirection::Right } else { MoveDirection::Left }),
                    Op::Attack(light) => e.spend_attack(if light { Element::Light } else { Element::Dark }),
                    Op::Orb(k) => e.add_orb(match k { 0 => OrbKind::Light, 1 => OrbKind::Dark, _ => OrbKind::Dual }),
                }
                prop_assert!((0.0..=e.max_energy()).contains(&e.light()));
                prop_assert!((0.0..=e.max_energy()).contains(&e.dark()));
            }
        }
    }
}
