//! Load cell workflows handed to the tasks as domain callbacks.
//!
//! The tasks never do sensor math themselves. The composition layer builds
//! the sampling task and the tare/calibration callbacks here and passes them
//! in; the callbacks run to completion inside a single tick, re-sampling the
//! sensor in a busy loop.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use log::{info, warn};

use crate::app_state::{AppMode, AppState};
use crate::config::ScaleConfig;
use crate::error::SensorError;
use crate::run_loop::FuncTask;
use crate::tasks::WorkFn;

/// A smoothed raw reading source, e.g. a NAU7802 behind a filter chain.
pub trait WeightSensor {
    fn sample(&mut self) -> Result<i32, SensorError>;

    /// Drop the smoothing history before a bulk re-sample.
    fn reset(&mut self);
}

/// Take `reads` samples, updating the raw reading, the weight and the read
/// counter after each one.
pub fn read_weight<S>(state: &mut AppState, sensor: &mut S, reads: u32) -> Result<(), SensorError>
where
    S: WeightSensor + ?Sized,
{
    for _ in 0..reads {
        let raw = sensor.sample()?;
        state.raw_reading = raw;
        state.weight = state.raw_to_weight(raw);
        state.read_count = state.read_count.wrapping_add(1);
    }
    Ok(())
}

/// Average of the raw reading over `reference_sample_count` fresh reads.
fn average_raw<S>(state: &mut AppState, sensor: &mut S, config: &ScaleConfig) -> Result<i32, SensorError>
where
    S: WeightSensor + ?Sized,
{
    sensor.reset();
    let batch = config.reads_per_tick.max(1);
    let mut sum: i64 = 0;
    let mut batches: i64 = 0;
    let mut read = 0;
    while read < config.reference_sample_count {
        read_weight(state, sensor, batch)?;
        read += batch;
        sum += i64::from(state.raw_reading);
        batches += 1;
    }
    if batches == 0 {
        return Ok(state.raw_reading);
    }
    Ok((sum / batches) as i32)
}

/// Re-measure the zero offset with an empty scale.
pub fn measure_zero_offset<S>(state: &mut AppState, sensor: &mut S, config: &ScaleConfig) -> Result<i32, SensorError>
where
    S: WeightSensor + ?Sized,
{
    let zero = average_raw(state, sensor, config)?;
    state.zero_offset = zero;
    state.weight = state.raw_to_weight(state.raw_reading);
    Ok(zero)
}

/// Re-measure the calibration factor with the reference weight on the scale.
///
/// A degenerate factor (no load change, or a non-positive reference weight)
/// leaves the previous factor in place.
pub fn measure_calibration_factor<S>(
    state: &mut AppState,
    sensor: &mut S,
    config: &ScaleConfig,
) -> Result<f32, SensorError>
where
    S: WeightSensor + ?Sized,
{
    let raw = average_raw(state, sensor, config)?;
    if config.reference_weight_grams <= 0 {
        warn!("Reference weight {} g is not usable", config.reference_weight_grams);
        return Ok(state.calibration_factor);
    }

    let factor = (raw as f32 - state.zero_offset as f32) / config.reference_weight_grams as f32;
    if factor == 0.0 {
        warn!("No load change seen; keeping calibration factor {}", state.calibration_factor);
        return Ok(state.calibration_factor);
    }
    state.calibration_factor = factor;
    state.weight = state.raw_to_weight(state.raw_reading);
    Ok(factor)
}

/// Surface a sensor failure through the application mode.
pub fn record_sensor_error(state: &mut AppState, err: SensorError) {
    match err {
        SensorError::NotFound => {
            warn!("{}", err);
            state.mode = AppMode::SensorNotFound;
        }
        SensorError::NotReady => warn!("{}; skipping", err),
    }
}

/// Task that samples the sensor every tick while the device is interactive.
pub fn sampling_task<S>(sensor: Rc<RefCell<S>>, reads_per_tick: u32) -> FuncTask
where
    S: WeightSensor + 'static,
{
    FuncTask::new("sampler", move |_, _, state| {
        if !state.mode.is_interactive() {
            return;
        }
        let mut sensor = sensor.borrow_mut();
        if let Err(err) = read_weight(state, &mut *sensor, reads_per_tick) {
            record_sensor_error(state, err);
        }
    })
}

/// Tare callback for a [`TaringTask`](crate::tasks::TaringTask).
pub fn taring_work<S>(sensor: Rc<RefCell<S>>, config: ScaleConfig) -> WorkFn
where
    S: WeightSensor + 'static,
{
    Box::new(move |state| {
        let mut sensor = sensor.borrow_mut();
        match measure_zero_offset(state, &mut *sensor, &config) {
            Ok(zero) => info!("Zero offset is now {}", zero),
            Err(err) => record_sensor_error(state, err),
        }
    })
}

/// Calibration callback for a [`CalibrationTask`](crate::tasks::CalibrationTask).
pub fn calibration_work<S>(sensor: Rc<RefCell<S>>, config: ScaleConfig) -> WorkFn
where
    S: WeightSensor + 'static,
{
    Box::new(move |state| {
        let mut sensor = sensor.borrow_mut();
        match measure_calibration_factor(state, &mut *sensor, &config) {
            Ok(factor) => info!("Calibration factor is now {}", factor),
            Err(err) => record_sensor_error(state, err),
        }
    })
}
