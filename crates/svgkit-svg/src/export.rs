//! Export planning and the rendering host seam.
//!
//! The core never draws. A backend implements [`RenderHost`]; the scene works out the
//! output size from an [`ExportScale`] and hands both to the host.

use crate::scene::Scene;
use crate::SvgError;
use svgkit_common::{default_export_params, ExportParams};
use tracing::debug;

/// How scene units map to output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportScale {
    Identity,
    Uniform(f32),
    NonUniform { sx: f32, sy: f32 },
    /// Scale to this output width, keeping the aspect ratio.
    FitWidth(f32),
}

/// Resolved output size and parameters for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub scale_x: f32,
    pub scale_y: f32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub params: ExportParams,
}

/// A rendering backend.
pub trait RenderHost {
    /// What a rasterization produces, e.g. a pixel buffer.
    type Output;

    /// Show the scene on screen.
    fn display(&mut self, scene: &Scene) -> Result<(), SvgError>;

    /// Render the scene off screen according to `plan`.
    fn rasterize(&mut self, scene: &Scene, plan: &ExportPlan) -> Result<Self::Output, SvgError>;
}

impl Scene {
    /// Work out the output size for `scale`.
    ///
    /// The exported area is `params.region` when set, the whole scene otherwise.
    pub fn plan_export(&self, scale: ExportScale, params: ExportParams) -> Result<ExportPlan, SvgError> {
        let (width, height) = match params.region {
            Some(region) => (region.width, region.height),
            None => (self.width(), self.height()),
        };
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(SvgError::InvalidSize { width, height });
        }

        let (scale_x, scale_y) = match scale {
            ExportScale::Identity => (1.0, 1.0),
            ExportScale::Uniform(s) => (s, s),
            ExportScale::NonUniform { sx, sy } => (sx, sy),
            ExportScale::FitWidth(target) => {
                let s = target / width;
                (s, s)
            }
        };

        let pixel_width = (width * scale_x).round();
        let pixel_height = (height * scale_y).round();
        let max = params.max_dimension as f32;
        if !(pixel_width >= 1.0 && pixel_height >= 1.0 && pixel_width <= max && pixel_height <= max) {
            return Err(SvgError::InvalidSize {
                width: pixel_width,
                height: pixel_height,
            });
        }

        Ok(ExportPlan {
            scale_x,
            scale_y,
            pixel_width: pixel_width as u32,
            pixel_height: pixel_height as u32,
            params,
        })
    }

    /// Rasterize through `host` with explicit parameters.
    pub fn export_with<H: RenderHost>(
        &self,
        host: &mut H,
        scale: ExportScale,
        params: ExportParams,
    ) -> Result<H::Output, SvgError> {
        let plan = self.plan_export(scale, params)?;
        debug!(
            width = plan.pixel_width,
            height = plan.pixel_height,
            "Exporting scene"
        );
        host.rasterize(self, &plan)
    }

    /// Rasterize through `host` with the process-wide default parameters.
    pub fn export<H: RenderHost>(&self, host: &mut H, scale: ExportScale) -> Result<H::Output, SvgError> {
        self.export_with(host, scale, default_export_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_str;
    use svgkit_common::config::ExportRegion;

    struct RecordingHost {
        plans: Vec<ExportPlan>,
    }

    impl RenderHost for RecordingHost {
        type Output = (u32, u32);

        fn display(&mut self, _scene: &Scene) -> Result<(), SvgError> {
            Ok(())
        }

        fn rasterize(&mut self, _scene: &Scene, plan: &ExportPlan) -> Result<Self::Output, SvgError> {
            self.plans.push(plan.clone());
            Ok((plan.pixel_width, plan.pixel_height))
        }
    }

    fn scene() -> Scene {
        load_str(r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100"/>"#).unwrap()
    }

    #[test]
    fn test_fit_width_keeps_aspect_ratio() {
        let plan = scene()
            .plan_export(ExportScale::FitWidth(400.0), ExportParams::default())
            .unwrap();
        assert_eq!((plan.scale_x, plan.scale_y), (2.0, 2.0));
        assert_eq!((plan.pixel_width, plan.pixel_height), (400, 200));
    }

    #[test]
    fn test_non_uniform_and_region() {
        let params = ExportParams {
            region: Some(ExportRegion {
                x: 10.0,
                y: 10.0,
                width: 50.0,
                height: 20.0,
            }),
            ..ExportParams::default()
        };
        let plan = scene()
            .plan_export(ExportScale::NonUniform { sx: 2.0, sy: 3.0 }, params)
            .unwrap();
        assert_eq!((plan.pixel_width, plan.pixel_height), (100, 60));
    }

    #[test]
    fn test_oversized_export_rejected() {
        let params = ExportParams {
            max_dimension: 300,
            ..ExportParams::default()
        };
        let err = scene()
            .plan_export(ExportScale::Uniform(2.0), params)
            .unwrap_err();
        assert!(matches!(err, SvgError::InvalidSize { .. }));
    }

    #[test]
    fn test_export_with_hands_plan_to_host() {
        let mut host = RecordingHost { plans: Vec::new() };
        let size = scene()
            .export_with(&mut host, ExportScale::Identity, ExportParams::default().with_background([1.0; 4]))
            .unwrap();
        assert_eq!(size, (200, 100));
        assert_eq!(host.plans[0].params.background, Some([1.0; 4]));
    }
}
