use chrono::{Datelike, Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Seasonal temperature: yearly sine peaking mid-July plus a slow warming trend.
fn temperature(day: NaiveDate, day_index: usize, rng: &mut SimpleRng) -> f64 {
    let phase = (day.ordinal() as f64 - 196.0) / 365.25 * 2.0 * std::f64::consts::PI;
    10.0 + 12.0 * phase.cos() + 0.002 * day_index as f64 + rng.gauss(0.0, 2.5)
}

fn main() {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_timeseries.csv".to_string());

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid start date");
    let days = 3 * 365;
    let stations = ["north", "south"];

    let mut writer = csv::Writer::from_path(&output_path).expect("Failed to create output file");
    writer
        .write_record(["date", "temperature", "humidity", "station"])
        .expect("Failed to write header");

    for i in 0..days {
        let day = start + Duration::days(i as i64);
        let temp = temperature(day, i, &mut rng);
        let humidity = (70.0 - 0.8 * (temp - 10.0) + rng.gauss(0.0, 5.0)).clamp(5.0, 100.0);

        // Roughly one sensor dropout every few weeks.
        let humidity = if rng.next_f64() < 0.04 {
            String::new()
        } else {
            format!("{humidity:.1}")
        };

        writer
            .write_record([
                day.format("%Y-%m-%d").to_string(),
                format!("{temp:.2}"),
                humidity,
                stations[i % stations.len()].to_string(),
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {days} daily rows to {output_path}");
}
