use spy_tui::app::NavigationState;
use spy_tui::config::IgnoreRules;
use spy_tui::core::{DetailMode, DirectoryListing, GridLayout, GridPos, Viewport, natural_cmp};

use rand::Rng;
use rand::seq::SliceRandom;
use std::fs::{self, File};
use tempfile::tempdir;

#[test]
fn test_end_to_end_grid() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    for name in ["b.txt", "10.txt", "2.txt"] {
        File::create(dir.path().join(name))?;
    }
    fs::create_dir(dir.path().join("A_dir"))?;

    let nav = NavigationState::open(dir.path(), IgnoreRules::new(), Viewport { rows: 2, cols: 20 })?;
    let names: Vec<String> = nav
        .listing()
        .entries()
        .iter()
        .map(|e| e.name_str().into_owned())
        .collect();
    assert_eq!(names, ["A_dir", "10.txt", "2.txt", "b.txt"]);

    let layout = nav.layout();
    assert_eq!((layout.rows(), layout.cols(), layout.pages()), (2, 2, 1));
    assert_eq!(layout.index_to_pos(0), GridPos { page: 0, col: 0, row: 0 });
    assert_eq!(layout.index_to_pos(3), GridPos { page: 0, col: 1, row: 1 });
    Ok(())
}

#[test]
fn test_index_mapping_is_a_bijection() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let len = rng.random_range(1..300);
        let viewport = Viewport {
            rows: rng.random_range(1..40),
            cols: rng.random_range(1..200),
        };
        let width = rng.random_range(1..30);
        let layout = GridLayout::compute(len, viewport, width);

        for idx in 0..len {
            let pos = layout.index_to_pos(idx);
            assert!(pos.page < layout.pages());
            assert!(pos.col < layout.cols());
            assert!(pos.row < layout.rows());
            assert_eq!(layout.pos_to_index(pos), idx, "layout {layout:?}");
        }
    }
}

#[test]
fn test_natural_order_is_stable_under_shuffle() {
    let expected = ["a", "B", "file1", "file2", "file10", "File11", "z"];
    let mut rng = rand::rng();
    for _ in 0..20 {
        let mut names = expected.to_vec();
        names.shuffle(&mut rng);
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, expected);
    }
}

#[test]
fn test_directories_sort_first_with_detail() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("small"), "x")?;
    fs::write(dir.path().join("large"), "x".repeat(4096))?;
    fs::create_dir(dir.path().join("zdir"))?;

    let listing = DirectoryListing::build(dir.path(), &IgnoreRules::new(), DetailMode::Size)?;
    let names: Vec<String> = listing
        .entries()
        .iter()
        .map(|e| e.name_str().into_owned())
        .collect();
    assert_eq!(names, ["zdir", "large", "small"]);
    Ok(())
}

#[test]
fn test_parent_selects_departed_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    for name in ["a", "m", "y", "z"] {
        fs::create_dir(dir.path().join(name))?;
    }
    let mut nav = NavigationState::open(&dir.path().join("y"), IgnoreRules::new(), Viewport::default())?;
    assert!(nav.go_parent());
    assert_eq!(nav.current_name().as_deref(), Some("y"));
    Ok(())
}
