use image::{Rgb, RgbImage};

use crate::{
    capture::VideoFrame,
    geometry_utils::{disc_points, line_points},
    tracking::{KeypointIndex, Pose},
};

/// Bones as (from, to) keypoint pairs
pub const SKELETON_CONNECTIONS: [(KeypointIndex, KeypointIndex); 16] = [
    // face
    (KeypointIndex::LeftEar, KeypointIndex::LeftEye),
    (KeypointIndex::LeftEye, KeypointIndex::Nose),
    (KeypointIndex::Nose, KeypointIndex::RightEye),
    (KeypointIndex::RightEye, KeypointIndex::RightEar),
    // arms
    (KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow),
    (KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
    (KeypointIndex::RightShoulder, KeypointIndex::RightElbow),
    (KeypointIndex::RightElbow, KeypointIndex::RightWrist),
    // torso
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftHip),
    (KeypointIndex::RightShoulder, KeypointIndex::RightHip),
    (KeypointIndex::LeftHip, KeypointIndex::RightHip),
    // legs
    (KeypointIndex::LeftHip, KeypointIndex::LeftKnee),
    (KeypointIndex::LeftKnee, KeypointIndex::LeftAnkle),
    (KeypointIndex::RightHip, KeypointIndex::RightKnee),
    (KeypointIndex::RightKnee, KeypointIndex::RightAnkle),
];

pub const BONE_COLOUR: Rgb<u8> = Rgb([255, 255, 0]);
pub const JOINT_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LOW_CONFIDENCE_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
pub const JOINT_RADIUS: i32 = 4;

pub const PEAK_METRIC_LABEL: &str = "Peak Jump (px)";

/// A processed frame, ready for display
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub index: u64,
    pub image: RgbImage,
    /// Set when a pose was tracked on this frame
    pub displacement: Option<f32>,
}

impl AnnotatedFrame {
    /// A frame shown as captured, with no overlay or caption
    pub fn plain(frame: VideoFrame) -> Self {
        AnnotatedFrame {
            index: frame.index,
            image: frame.image,
            displacement: None,
        }
    }

    pub fn caption(&self) -> Option<String> {
        self.displacement.map(format_caption)
    }
}

pub fn format_caption(displacement: f32) -> String {
    format!("Jump: {:.1} px", displacement)
}

/// Peak displacement as shown in the metric readout
pub fn format_metric(peak: f32) -> String {
    format!("{:.1}", peak)
}

/// Draw the pose skeleton onto the frame and attach the displacement caption
pub fn annotate(
    frame: VideoFrame,
    pose: &Pose,
    displacement: f32,
    confidence_threshold: f32,
) -> AnnotatedFrame {
    let mut image = frame.image;
    draw_skeleton(&mut image, pose, confidence_threshold);
    AnnotatedFrame {
        index: frame.index,
        image,
        displacement: Some(displacement),
    }
}

/// Bones are drawn only between two confident keypoints; every joint gets a dot,
/// coloured by confidence. Keypoints well off the frame are skipped.
pub fn draw_skeleton(image: &mut RgbImage, pose: &Pose, confidence_threshold: f32) {
    let (width, height) = image.dimensions();

    for (from, to) in SKELETON_CONNECTIONS.iter() {
        let a = pose.get(*from);
        let b = pose.get(*to);
        if a.is_in_range()
            && b.is_in_range()
            && a.is_valid(confidence_threshold)
            && b.is_valid(confidence_threshold)
        {
            let (x0, y0) = a.to_pixel(width, height);
            let (x1, y1) = b.to_pixel(width, height);
            for (x, y) in line_points(x0, y0, x1, y1) {
                put_pixel_clipped(image, x, y, BONE_COLOUR);
            }
        }
    }

    for keypoint in pose.keypoints.iter().filter(|k| k.is_in_range()) {
        let colour = if keypoint.is_valid(confidence_threshold) {
            JOINT_COLOUR
        } else {
            LOW_CONFIDENCE_COLOUR
        };
        let (cx, cy) = keypoint.to_pixel(width, height);
        for (x, y) in disc_points(cx, cy, JOINT_RADIUS) {
            put_pixel_clipped(image, x, y, colour);
        }
    }
}

fn put_pixel_clipped(image: &mut RgbImage, x: i32, y: i32, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::Keypoint;

    fn blank_frame() -> VideoFrame {
        VideoFrame::new(7, RgbImage::new(100, 100))
    }

    #[test]
    fn test_caption_and_metric_format() {
        assert_eq!(format_caption(12.345), "Jump: 12.3 px");
        assert_eq!(format_caption(0.), "Jump: 0.0 px");
        assert_eq!(format_metric(50.), "50.0");
        assert_eq!(format_metric(3.96), "4.0");
    }

    #[test]
    fn test_plain_frame_is_untouched() {
        let annotated = AnnotatedFrame::plain(blank_frame());
        assert_eq!(annotated.index, 7);
        assert_eq!(annotated.caption(), None);
        assert!(annotated.image.pixels().all(|p| p == &Rgb([0, 0, 0])));
    }

    #[test]
    fn test_annotate_draws_confident_bones_and_joints() {
        let mut pose = Pose::default();
        pose.keypoints[KeypointIndex::LeftKnee as usize] = Keypoint::new(0.2, 0.5, 0.9);
        pose.keypoints[KeypointIndex::LeftAnkle as usize] = Keypoint::new(0.8, 0.5, 0.9);

        let annotated = annotate(blank_frame(), &pose, 12.0, 0.3);
        assert_eq!(annotated.caption().as_deref(), Some("Jump: 12.0 px"));

        // Midway along the knee-ankle bone
        assert_eq!(annotated.image.get_pixel(50, 50), &BONE_COLOUR);
        // Joint centres
        assert_eq!(annotated.image.get_pixel(20, 50), &JOINT_COLOUR);
        assert_eq!(annotated.image.get_pixel(80, 50), &JOINT_COLOUR);
        // The other (zero confidence) keypoints sit at the origin
        assert_eq!(annotated.image.get_pixel(0, 0), &LOW_CONFIDENCE_COLOUR);
    }

    #[test]
    fn test_low_confidence_bones_are_skipped() {
        let mut pose = Pose::default();
        pose.keypoints[KeypointIndex::LeftKnee as usize] = Keypoint::new(0.2, 0.5, 0.9);
        pose.keypoints[KeypointIndex::LeftAnkle as usize] = Keypoint::new(0.8, 0.5, 0.1);

        let annotated = annotate(blank_frame(), &pose, 0.0, 0.3);
        assert_eq!(annotated.image.get_pixel(50, 50), &Rgb([0, 0, 0]));
        assert_eq!(annotated.image.get_pixel(80, 50), &LOW_CONFIDENCE_COLOUR);
    }

    #[test]
    fn test_wild_keypoints_are_skipped() {
        let mut pose = Pose::default();
        pose.keypoints[KeypointIndex::Nose as usize] = Keypoint::new(1e10, 0.5, 0.1);
        pose.keypoints[KeypointIndex::LeftEye as usize] = Keypoint::new(0.5, f32::NAN, 0.9);
        pose.keypoints[KeypointIndex::LeftEar as usize] = Keypoint::new(-1e10, -1e10, 0.9);
        pose.keypoints[KeypointIndex::LeftAnkle as usize] = Keypoint::new(0.5, 0.75, 0.9);

        let annotated = annotate(blank_frame(), &pose, 0.0, 0.3);
        assert_eq!(annotated.image.get_pixel(50, 75), &JOINT_COLOUR);
        // Nose-eye and eye-ear bones never drawn
        assert_eq!(annotated.image.get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_keypoints_outside_the_frame_are_clipped() {
        let mut pose = Pose::default();
        pose.keypoints[KeypointIndex::Nose as usize] = Keypoint::new(1.5, -0.2, 0.9);
        pose.keypoints[KeypointIndex::LeftEye as usize] = Keypoint::new(0.5, 0.5, 0.9);

        let annotated = annotate(blank_frame(), &pose, 0.0, 0.3);
        assert_eq!(annotated.image.dimensions(), (100, 100));
    }
}
