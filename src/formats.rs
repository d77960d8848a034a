// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! Human friendly rendering of simulated durations.

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Renders `seconds` in the largest unit that keeps the value at or above two.
///
/// # Example
/// ```rust
/// use queue_analysis::formats::human_readable;
///
/// assert_eq!(human_readable(90.0), "90.00 sec");
/// assert_eq!(human_readable(3600.0), "60.00 min");
/// ```
pub fn human_readable(seconds: f64) -> String {
    if seconds < 2.0 * MINUTE {
        format!("{seconds:.2} sec")
    } else if seconds < 2.0 * HOUR {
        format!("{:.2} min", seconds / MINUTE)
    } else if seconds < 2.0 * DAY {
        format!("{:.2} hr", seconds / HOUR)
    } else {
        format!("{:.2} days", seconds / DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::human_readable;

    #[test]
    fn picks_the_unit_by_magnitude() {
        assert_eq!(human_readable(0.5), "0.50 sec");
        assert_eq!(human_readable(119.0), "119.00 sec");
        assert_eq!(human_readable(120.0), "2.00 min");
        assert_eq!(human_readable(3.0 * 3600.0), "3.00 hr");
        assert_eq!(human_readable(3.0 * 86_400.0), "3.00 days");
    }
}
