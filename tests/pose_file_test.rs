use serde_json::json;
use sparse_point_seeder::SeedError;
use sparse_point_seeder::pose_file::{PoseFile, PoseFrame};

const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn frame(name: &str) -> PoseFrame {
    PoseFrame {
        camera_linear_velocity: None,
        camera_angular_velocity: None,
        file_path: format!("./images/{}", name),
        transform_matrix: IDENTITY,
        extra: Default::default(),
    }
}

fn pose_file(value: serde_json::Value) -> PoseFile {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_intrinsics_from_focal_lengths() {
    let pf = pose_file(json!({
        "fl_x": 500.0, "fl_y": 510.0, "cx": 321.5, "cy": 239.5, "frames": []
    }));
    let intr = pf.intrinsics().unwrap();
    assert_eq!((intr.fl_x, intr.fl_y, intr.cx, intr.cy), (500.0, 510.0, 321.5, 239.5));

    // principal point defaults to the image center
    let pf = pose_file(json!({ "fl_x": 500, "w": 640, "h": 480, "frames": [] }));
    let intr = pf.intrinsics().unwrap();
    assert_eq!((intr.fl_x, intr.fl_y, intr.cx, intr.cy), (500.0, 500.0, 320.0, 240.0));
}

#[test]
fn test_intrinsics_from_fov() {
    for key in ["fov", "camera_angle_x"] {
        let pf = pose_file(json!({ key: 1.0, "w": 640, "h": 480, "frames": [] }));
        let intr = pf.intrinsics().unwrap();
        let fl = 320.0 / 0.5f64.tan();
        assert!((intr.fl_x - fl).abs() < 1e-9);
        assert!((intr.fl_y - fl).abs() < 1e-9);
        assert_eq!((intr.cx, intr.cy), (320.0, 240.0));
    }
}

#[test]
fn test_intrinsics_missing() {
    let pf = pose_file(json!({ "w": 640, "h": 480, "frames": [] }));
    assert!(matches!(pf.intrinsics(), Err(SeedError::MissingField(_))));
    let pf = pose_file(json!({ "fov": 1.0, "frames": [] }));
    assert!(matches!(pf.intrinsics(), Err(SeedError::MissingField("w"))));
}

#[test]
fn test_split_every_eighth_frame() {
    let mut names: Vec<String> = (0..17).map(|i| format!("frame_{:02}.png", i)).collect();
    names.reverse();
    let pf = PoseFile {
        extra: Default::default(),
        frames: names.iter().map(|n| frame(n)).collect(),
        ply_file_path: None,
    };
    let (training, eval) = pf.split_frames(8).unwrap();
    let eval_names: Vec<&str> = eval.iter().map(|f| f.file_path.as_str()).collect();
    assert_eq!(
        eval_names,
        ["./images/frame_00.png", "./images/frame_08.png", "./images/frame_16.png"]
    );
    assert_eq!(training.len(), 14);
    assert_eq!(training[0].file_path, "./images/frame_01.png");
    assert!(training.windows(2).all(|w| w[0].file_path < w[1].file_path));

    let (training, eval) = pf.split_frames(0).unwrap();
    assert_eq!(training.len(), 17);
    assert!(eval.is_empty());
}

#[test]
fn test_moving_eval_frame_is_rejected() {
    let mut frames: Vec<PoseFrame> = (0..9).map(|i| frame(&format!("{:02}.png", i))).collect();
    // training frames may move
    frames[3].camera_linear_velocity = Some([1.0, 0.0, 0.0]);
    let mut pf = PoseFile {
        extra: Default::default(),
        frames,
        ply_file_path: None,
    };
    assert!(pf.split_frames(8).is_ok());

    pf.frames[8].camera_angular_velocity = Some([0.0, 0.0, 0.5]);
    match pf.split_frames(8) {
        Err(SeedError::MovingEvalFrame { file_path, velocity }) => {
            assert_eq!(file_path, "./images/08.png");
            assert!((velocity - 0.5).abs() < 1e-12);
        }
        other => panic!("expected a moving evaluation frame error, got {:?}", other),
    }
}

#[test]
fn test_unknown_fields_survive_save() {
    let source = json!({
        "camera_angle_x": 0.9,
        "aabb_scale": 16,
        "custom": { "nested": [1, 2, 3] },
        "frames": [{
            "file_path": "./images/a.png",
            "transform_matrix": IDENTITY,
            "sharpness": 12.5
        }]
    });
    let mut pf = pose_file(source.clone());
    assert_eq!(pf.frames[0].extra["sharpness"], json!(12.5));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transforms.json");
    pf.save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n    \"frames\": ["));
    let reloaded: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reloaded, source);

    pf.set_point_cloud("sparse_pc.ply");
    pf.save(&path).unwrap();
    let reloaded = PoseFile::load(&path).unwrap();
    assert_eq!(reloaded.ply_file_path.as_deref(), Some("./sparse_pc.ply"));
    assert_eq!(reloaded.extra["custom"], source["custom"]);
}

#[test]
fn test_rewrite_keeps_floats_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transforms.json");
    let text = r#"{
    "fl_x": 1111.1111111111113,
    "frames": [
        {
            "file_path": "./images/a.png",
            "transform_matrix": [
                [0.9999999999999998, 0.0, 0.0, 43.260641608760444],
                [0.0, 1.0, 0.0, -7.105427357601002e-15],
                [0.0, 0.0, 1.0, 0.1],
                [0.0, 0.0, 0.0, 1.0]
            ]
        }
    ]
}"#;
    std::fs::write(&path, text).unwrap();
    let mut pf = PoseFile::load(&path).unwrap();
    assert_eq!(pf.frames[0].transform_matrix[0][3], 43.260641608760444);
    pf.set_point_cloud("sparse_pc.ply");
    pf.save(&path).unwrap();
    let saved = std::fs::read_to_string(&path).unwrap();
    for literal in ["1111.1111111111113", "0.9999999999999998", "43.260641608760444"] {
        assert!(saved.contains(literal), "{} lost in\n{}", literal, saved);
    }
    let reloaded = PoseFile::load(&path).unwrap();
    assert_eq!(reloaded.frames, pf.frames);
    assert_eq!(reloaded.number("fl_x"), Some(1111.1111111111113));
}
