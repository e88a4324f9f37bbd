//! Apparent temperature from air temperature and relative humidity.
//!
//! Uses the NWS approach: Steadman's simple average first, then the Rothfusz
//! regression with its two humidity adjustments once the simple estimate
//! passes 79 °F. All intermediate math runs in Fahrenheit.

fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

fn fahrenheit_to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) / 1.8
}

fn abs(value: f32) -> f32 {
    if value < 0.0 { -value } else { value }
}

/// Square root by Newton iteration; inputs here stay within 0..=17.
fn sqrt(value: f32) -> f32 {
    if value <= 0.0 {
        return 0.0;
    }
    let mut estimate = if value > 1.0 { value / 2.0 } else { 1.0 };
    for _ in 0..8 {
        estimate = 0.5 * (estimate + value / estimate);
    }
    estimate
}

/// Heat index in °C for `temperature` (°C) and `humidity` (%RH).
///
/// Inputs must already be validated as non-NaN.
#[must_use]
pub fn heat_index_celsius(temperature: f32, humidity: f32) -> f32 {
    let t = celsius_to_fahrenheit(temperature);
    let rh = humidity;

    let mut hi = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + rh * 0.094);

    if hi > 79.0 {
        hi = -42.379 + 2.049_015_2 * t + 10.143_331 * rh
            - 0.224_755_41 * t * rh
            - 0.006_837_83 * t * t
            - 0.054_817_17 * rh * rh
            + 0.001_228_74 * t * t * rh
            + 0.000_852_82 * t * rh * rh
            - 0.000_001_99 * t * t * rh * rh;

        if rh < 13.0 && (80.0..=112.0).contains(&t) {
            hi -= (13.0 - rh) * 0.25 * sqrt((17.0 - abs(t - 95.0)) * 0.058_82);
        } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
            hi += (rh - 85.0) * 0.1 * ((87.0 - t) * 0.2);
        }
    }

    fahrenheit_to_celsius(hi)
}
