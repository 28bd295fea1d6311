//! Opt-in timing hooks for the reconstruction pipeline.
//!
//! Timing is only collected when the `modeller_metrics` feature is enabled.
//! Without it every call compiles down to running the closure.
//!
//! ```ignore
//! let mut metrics = PipelineMetrics::default();
//! metrics.begin();
//! let rings = metrics.time(TimingBucket::RingFit, || fit_rings(&curves));
//! if let Some(report) = metrics.end() {
//!     println!("ring fit: {} ns", report.ring_fit_ns);
//! }
//! ```

/// Phases of the pipeline that accumulate time separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Landmark curve fitting (profile and leaflet curves).
    CurveFit,
    /// Cross-section plane generation.
    PlaneGeneration,
    /// Ring extraction and closed spline re-fitting.
    RingFit,
    /// Quad/polygon triangulation.
    Triangulation,
    /// Vertex welding and degenerate culling.
    Welding,
    /// Boundary loop detection and hole filling.
    HoleFill,
    /// Winding, orientation and normal computation.
    Normals,
    /// Topology counting for diagnostics.
    Diagnostics,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TimingReport {
    pub curve_fit_ns: u64,
    pub plane_generation_ns: u64,
    pub ring_fit_ns: u64,
    pub triangulation_ns: u64,
    pub welding_ns: u64,
    pub hole_fill_ns: u64,
    pub normals_ns: u64,
    pub diagnostics_ns: u64,
}

impl TimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.curve_fit_ns
            .saturating_add(self.plane_generation_ns)
            .saturating_add(self.ring_fit_ns)
            .saturating_add(self.triangulation_ns)
            .saturating_add(self.welding_ns)
            .saturating_add(self.hole_fill_ns)
            .saturating_add(self.normals_ns)
            .saturating_add(self.diagnostics_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg_attr(not(feature = "modeller_metrics"), allow(dead_code))]
    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::CurveFit => &mut self.curve_fit_ns,
            TimingBucket::PlaneGeneration => &mut self.plane_generation_ns,
            TimingBucket::RingFit => &mut self.ring_fit_ns,
            TimingBucket::Triangulation => &mut self.triangulation_ns,
            TimingBucket::Welding => &mut self.welding_ns,
            TimingBucket::HoleFill => &mut self.hole_fill_ns,
            TimingBucket::Normals => &mut self.normals_ns,
            TimingBucket::Diagnostics => &mut self.diagnostics_ns,
        }
    }
}

/// Accumulator; call [`begin`](Self::begin), wrap work in
/// [`time`](Self::time), then read [`end`](Self::end).
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    #[cfg(feature = "modeller_metrics")]
    report: TimingReport,
}

impl PipelineMetrics {
    pub fn begin(&mut self) {
        #[cfg(feature = "modeller_metrics")]
        {
            self.report = TimingReport::default();
        }
    }

    /// The accumulated report, or `None` when metrics are compiled out.
    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(feature = "modeller_metrics")]
        {
            Some(self.report.clone())
        }
        #[cfg(not(feature = "modeller_metrics"))]
        {
            None
        }
    }

    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(feature = "modeller_metrics")]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(feature = "modeller_metrics"))]
        {
            let _ = bucket;
            f()
        }
    }
}
