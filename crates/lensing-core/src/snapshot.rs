use crate::clock::SimulationState;
use crate::params::ParameterSet;

/// Number of `f32` fields in a [`UniformSnapshot`].
pub const SNAPSHOT_FIELDS: usize = 15;

/// One frame's parameter block, uploaded as-is to the lensing kernel.
/// Field order and width must match the `Uniforms` struct in `lensing.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformSnapshot {
    pub elapsed_time: f32,
    pub rotation_angle: f32,
    pub near_star_density: f32,
    pub distant_star_density: f32,
    pub nebula_intensity: f32,
    pub schwarzschild_radius: f32,
    pub integration_step: f32,
    pub gravity_acceleration: f32,
    pub disk_inner_limit: f32,
    pub disk_outer_limit: f32,
    pub doppler_intensity: f32,
    pub flow_frequency: f32,
    pub camera_distance: f32,
    pub resolved_rotation: f32,
    pub auto_rotation_flag: f32,
}

impl UniformSnapshot {
    pub fn as_array(&self) -> &[f32; SNAPSHOT_FIELDS] {
        bytemuck::cast_ref(self)
    }

    pub fn auto_rotation(&self) -> bool {
        self.auto_rotation_flag != 0.0
    }
}

/// Assemble the snapshot for one frame. Pure: same inputs, same bits.
pub fn build(params: &ParameterSet, sim: &SimulationState) -> UniformSnapshot {
    let auto = params.rotation.is_auto();
    UniformSnapshot {
        elapsed_time: sim.elapsed_time,
        rotation_angle: sim.auto_angle,
        near_star_density: params.near_star_density,
        distant_star_density: params.distant_star_density,
        nebula_intensity: params.nebula_intensity,
        schwarzschild_radius: params.schwarzschild_radius,
        integration_step: params.integration_step,
        gravity_acceleration: params.gravity_acceleration,
        disk_inner_limit: params.disk_inner_limit,
        disk_outer_limit: params.disk_outer_limit,
        doppler_intensity: params.doppler_intensity,
        flow_frequency: params.flow_frequency,
        camera_distance: params.camera_distance,
        resolved_rotation: params.rotation.resolve(sim.auto_angle),
        auto_rotation_flag: if auto { 1.0 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;
    use crate::params::ParameterStore;

    fn advanced(n: usize) -> SimulationState {
        let mut clock = SimulationClock::new();
        for _ in 0..n {
            clock.advance();
        }
        clock.state()
    }

    // --- Layout -------------------------------------------------------------------

    #[test]
    fn layout_is_fifteen_packed_floats() {
        assert_eq!(std::mem::size_of::<UniformSnapshot>(), 60);
        assert_eq!(std::mem::align_of::<UniformSnapshot>(), 4);
    }

    #[test]
    fn array_view_follows_field_order() {
        let mut store = ParameterStore::new();
        store.set_manual_rotation(0.5);
        let s = build(store.current(), &advanced(3));
        let a = s.as_array();
        assert_eq!(a[0], s.elapsed_time);
        assert_eq!(a[1], s.rotation_angle);
        assert_eq!(a[2], 0.98);
        assert_eq!(a[3], 0.95);
        assert_eq!(a[4], 1.0);
        assert_eq!(a[5], 1.0);
        assert_eq!(a[6], 0.1);
        assert_eq!(a[7], -1.5);
        assert_eq!(a[8], 2.6);
        assert_eq!(a[9], 8.5);
        assert_eq!(a[10], 0.75);
        assert_eq!(a[11], 10.0);
        assert_eq!(a[12], 30.0);
        assert_eq!(a[13], 0.5);
        assert_eq!(a[14], 0.0);
    }

    // --- Determinism --------------------------------------------------------------

    #[test]
    fn build_is_bit_identical_for_same_inputs() {
        let mut store = ParameterStore::new();
        store.set_doppler_intensity(1.3);
        let sim = advanced(17);
        let a = build(store.current(), &sim);
        let b = build(store.current(), &sim);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }

    // --- Rotation -----------------------------------------------------------------

    #[test]
    fn manual_rotation_resolves_to_theta_regardless_of_prior_mode() {
        for start_auto in [true, false] {
            let mut store = ParameterStore::new();
            store.set_auto_rotation(start_auto);
            store.set_manual_rotation(4.2);
            let s = build(store.current(), &advanced(50));
            assert_eq!(s.resolved_rotation, 4.2);
            assert_eq!(s.auto_rotation_flag, 0.0);
            assert!(!s.auto_rotation());
        }
    }

    #[test]
    fn auto_rotation_resolves_to_clock_angle() {
        let mut store = ParameterStore::new();
        store.set_manual_rotation(4.2);
        store.set_auto_rotation(true);
        let sim = advanced(50);
        let s = build(store.current(), &sim);
        assert_eq!(s.resolved_rotation, sim.auto_angle);
        assert_eq!(s.rotation_angle, sim.auto_angle);
        assert_eq!(s.auto_rotation_flag, 1.0);
    }

    // --- End to end ---------------------------------------------------------------

    #[test]
    fn defaults_after_one_advance() {
        let store = ParameterStore::new();
        let s = build(store.current(), &advanced(1));
        assert_eq!(s.elapsed_time, 1.0 / 60.0);
        assert_eq!(s.rotation_angle, 0.002);
        assert_eq!(s.auto_rotation_flag, 1.0);
        assert!(s.disk_inner_limit < s.disk_outer_limit);
    }
}
