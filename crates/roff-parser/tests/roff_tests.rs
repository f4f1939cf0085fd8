//! Integration tests for reading, writing and converting ROFF grids.

use std::io::Cursor;

use grid_common::{
    CanonicalGrid, ConversionConfig, Dimensions, GeometryTolerance, GridError, Quadrant,
    RoffFormat, Subgrid, Tolerance,
};
use roff_parser::{RoffError, RoffGrid};
use test_utils::{
    assert_approx_eq, assert_grids_approx_eq, checkerboard_active, create_box_grid, create_dipping_grid,
    create_faulted_grid, create_single_cell_grid, fixtures, require_test_file, temp_test_dir,
    with_active, with_subgrids, write_test_file,
};

fn parse(text: &str) -> Result<RoffGrid, RoffError> {
    RoffGrid::from_reader(Cursor::new(text.as_bytes()))
}

fn fixture_with(from: &str, to: &str) -> String {
    let text = fixtures::roff::SINGLE_CELL_ASCII;
    assert!(text.contains(from), "fixture does not contain {:?}", from);
    text.replace(from, to)
}

#[test]
fn test_read_single_cell_fixture() {
    let grid = parse(fixtures::roff::SINGLE_CELL_ASCII).unwrap();

    assert_eq!(grid.dimensions(), Dimensions::new(1, 1, 1).unwrap());
    assert_eq!(grid.scale(), [1.0, 1.0, -1.0]);
    assert_eq!(grid.active(), &[true]);
    assert_eq!(grid.subgrids(), None);
    assert_eq!(grid.to_canonical().unwrap(), create_single_cell_grid());
}

#[test]
fn test_binary_file_roundtrip() {
    let grid = parse(fixtures::roff::SINGLE_CELL_ASCII).unwrap();
    let dir = temp_test_dir();
    let path = dir.path().join("cell.roff");

    grid.to_file(&path, RoffFormat::Binary).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"roff-bin\0"));

    assert_eq!(RoffGrid::from_file(&path).unwrap(), grid);
}

#[test]
fn test_ascii_file_roundtrip() {
    let original = with_active(create_faulted_grid(3, 2, 2, 2.5), checkerboard_active(3, 2, 2));
    let grid = RoffGrid::from_canonical(&original).unwrap();
    let dir = temp_test_dir();
    let path = dir.path().join("faulted.roffasc");

    grid.to_file(&path, RoffFormat::Ascii).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("roff-asc\n"));
    assert!(text.contains("tag dimensions\nint nX 3\nint nY 2\nint nZ 2\nendtag\n"));

    let reread = RoffGrid::from_file(&path).unwrap();
    assert_eq!(reread, grid);
    assert_eq!(reread.to_canonical().unwrap(), original);
}

#[test]
fn test_canonical_roundtrip_faulted_grid() {
    let original = with_active(create_faulted_grid(2, 3, 3, 1.5), checkerboard_active(2, 3, 3));

    let roff = RoffGrid::from_canonical(&original).unwrap();
    assert_eq!(roff.zvalues().split_enz().map(|split| split.len()), Some(3 * 4 * 4));

    assert_eq!(roff.to_canonical().unwrap(), original);
}

#[test]
fn test_canonical_roundtrip_with_subgrids() {
    let original = with_subgrids(create_dipping_grid(2, 2, 5), &[2, 3]);

    let roff = RoffGrid::from_canonical(&original).unwrap();
    assert_eq!(roff.subgrids(), Some([2, 3].as_slice()));

    let mut out = Vec::new();
    roff.to_writer(&mut out, RoffFormat::Binary).unwrap();
    let reread = RoffGrid::from_reader(out.as_slice()).unwrap();

    assert_eq!(reread.to_canonical().unwrap(), original);
}

#[test]
fn test_rotated_grid_roundtrip_is_close() {
    let dims = Dimensions::new(3, 3, 2).unwrap();
    let original =
        CanonicalGrid::create_box(dims, (1000.0, 2000.0, 1500.0), (25.0, 50.0, 2.0), 30.0).unwrap();

    let converted = RoffGrid::from_canonical(&original)
        .unwrap()
        .to_canonical()
        .unwrap();

    assert_grids_approx_eq!(converted, original, 1e-3);
}

#[test]
fn test_utm_coordinates_keep_precision() {
    let dims = Dimensions::new(3, 2, 2).unwrap();
    let original =
        CanonicalGrid::create_box(dims, (456000.25, 6780000.125, 1500.0), (12.5, 25.0, 2.0), 30.0)
            .unwrap();

    let roff = RoffGrid::from_canonical(&original).unwrap();
    let offset = roff.offset();
    assert_eq!(offset[2], 0.0);
    assert!(offset[0] > 455000.0 && offset[1] > 6779000.0);

    let mut out = Vec::new();
    roff.to_writer(&mut out, RoffFormat::Binary).unwrap();
    let reread = RoffGrid::from_reader(out.as_slice()).unwrap();
    assert_eq!(reread.offset(), offset);

    let converted = reread.to_canonical().unwrap();
    for (&read, &expected) in converted.coordinates().iter().zip(original.coordinates()) {
        assert_approx_eq!(read, expected, 1e-3);
    }
    assert_eq!(converted.corner_depths(), original.corner_depths());
}

#[test]
fn test_non_contiguous_subgrid_is_unsupported() {
    let grid = create_box_grid(1, 1, 3)
        .with_subgrids(vec![Subgrid::new("gap", vec![0, 2])])
        .unwrap();

    let err = RoffGrid::from_canonical(&grid).unwrap_err();
    assert!(err.is_unsupported());
    assert!(matches!(err, RoffError::NonContiguousSubgrid(name) if name == "gap"));
}

#[test]
fn test_subgrids_beyond_grid_are_rejected() {
    let grid = parse(fixtures::roff::SINGLE_CELL_ASCII)
        .unwrap()
        .with_subgrids(vec![1, 1]);
    assert!(matches!(grid.to_canonical(), Err(RoffError::Grid(_))));
}

#[test]
fn test_horizontal_split_is_rejected() {
    let dims = Dimensions::new(1, 1, 2).unwrap();
    let mut corner_lines = Vec::new();
    for (x, y) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        corner_lines.extend_from_slice(&[x, y, -2.0, x, y, 0.0]);
    }
    // the middle node of pillar (1, 1) stores 1.5 below and 1.0 above
    let mut split = vec![1u8; dims.num_nodes()];
    split[10] = 2;
    let mut zvals = vec![-2.0, -1.0, 0.0, -2.0, -1.0, 0.0, -2.0, -1.0, 0.0, -2.0];
    zvals.extend([-1.5, -1.0, 0.0]);
    let grid = RoffGrid::new(dims, corner_lines, Some(split), zvals, vec![true; 2]).unwrap();

    let err = grid.to_canonical().unwrap_err();
    assert!(err.is_unsupported());
    assert!(matches!(err, RoffError::HorizontalSplit { i: 1, j: 1, k: 1, .. }));

    let config = ConversionConfig {
        split_tolerance: Tolerance::new(1.0, 0.0),
        ..Default::default()
    };
    let canonical = grid.to_canonical_with(&config).unwrap();
    assert_eq!(canonical.corner_depth(1, 1, 1, Quadrant::SouthWest), 1.5);
}

#[test]
fn test_missing_transform_uses_defaults() {
    let text = fixture_with(
        "tag translate\nfloat xoffset 0.0\nfloat yoffset 0.0\nfloat zoffset 0.0\nendtag\n\
         tag scale\nfloat xscale 1.0\nfloat yscale 1.0\nfloat zscale -1.0\nendtag\n",
        "",
    );
    let grid = parse(&text).unwrap();
    assert_eq!(grid, parse(fixtures::roff::SINGLE_CELL_ASCII).unwrap());
}

#[test]
fn test_missing_split_encoding() {
    let text = fixture_with("array byte splitEnz 8\n 1 1 1 1 1 1 1 1\n", "");
    let grid = parse(&text).unwrap();
    assert_eq!(grid.zvalues().split_enz(), None);
    assert_eq!(grid.to_canonical().unwrap(), create_single_cell_grid());
}

#[test]
fn test_unknown_tags_are_ignored() {
    let text = fixture_with("tag eof\n", "tag parameter\nchar name \"PORO\"\nendtag\ntag eof\n");
    assert!(parse(&text).is_ok());
}

#[test]
fn test_wrong_filetype() {
    let text = fixture_with("char filetype \"grid\"", "char filetype \"surface\"");
    let err = parse(&text).unwrap_err();
    assert!(err.is_format_error());
    assert!(matches!(err, RoffError::WrongFiletype(filetype) if filetype == "surface"));
}

#[test]
fn test_missing_filetype() {
    let text = fixture_with("char filetype \"grid\"\n", "");
    assert!(matches!(parse(&text), Err(RoffError::MissingFiletype)));
}

#[test]
fn test_duplicate_key() {
    let text = fixture_with("int nZ 1\n", "int nZ 1\nint nZ 1\n");
    match parse(&text) {
        Err(RoffError::DuplicateKey { tag, key }) => {
            assert_eq!(tag, "dimensions");
            assert_eq!(key, "nZ");
        }
        other => panic!("expected duplicate key, got {:?}", other),
    }
}

#[test]
fn test_missing_active() {
    let text = fixture_with("tag active\narray bool data 1\n 1\nendtag\n", "");
    assert!(matches!(
        parse(&text),
        Err(RoffError::MissingKey { tag: "active", key: "data" })
    ));
}

#[test]
fn test_type_mismatch() {
    let text = fixture_with("int nX 1", "float nX 1.0");
    let err = parse(&text).unwrap_err();
    assert!(matches!(
        err,
        RoffError::TypeMismatch {
            tag: "dimensions",
            key: "nX",
            expected: "int",
            found: "float",
        }
    ));
    assert_eq!(err.to_string(), "Key dimensions.nX should be int, found float");
}

#[test]
fn test_negative_dimension() {
    let text = fixture_with("int nY 1", "int nY -1");
    assert!(matches!(
        parse(&text),
        Err(RoffError::InvalidValue { tag: "dimensions", key: "nY", .. })
    ));
}

#[test]
fn test_unindexable_dimensions() {
    let text = fixtures::roff::SINGLE_CELL_ASCII
        .replace("int nX 1", "int nX 2000000000")
        .replace("int nY 1", "int nY 2000000000")
        .replace("int nZ 1", "int nZ 2000000000");
    assert!(matches!(
        parse(&text),
        Err(RoffError::Grid(GridError::DimensionsTooLarge { .. }))
    ));
}

#[test]
fn test_array_length_mismatch() {
    let text = fixture_with(
        "array bool data 1\n 1\n",
        "array bool data 2\n 1 0\n",
    );
    assert!(matches!(parse(&text), Err(RoffError::Grid(_))));
}

#[test]
fn test_not_a_roff_file() {
    let dir = temp_test_dir();
    let path = write_test_file(dir.path(), "cell.grdecl", fixtures::grdecl::SINGLE_CELL);
    assert!(matches!(RoffGrid::from_file(&path), Err(RoffError::InvalidHeader)));
}

#[test]
fn test_same_geometry_across_encodings() {
    let ascii = RoffGrid::from_canonical(&create_dipping_grid(3, 3, 3)).unwrap();
    let mut out = Vec::new();
    ascii.to_writer(&mut out, RoffFormat::Binary).unwrap();
    let binary = RoffGrid::from_reader(out.as_slice()).unwrap();

    let tolerance = ConversionConfig::default().geometry_tolerance;
    assert!(ascii.same_geometry(&binary, tolerance).unwrap());

    let deeper = RoffGrid::from_canonical(&with_depth_shift(&create_dipping_grid(3, 3, 3), 1.0)).unwrap();
    assert!(!ascii.same_geometry(&deeper, tolerance).unwrap());
    assert!(ascii
        .same_geometry(&deeper, GeometryTolerance { coordinates: 0.1, depths: 1.5 })
        .unwrap());
}

fn with_depth_shift(grid: &CanonicalGrid, shift: f32) -> CanonicalGrid {
    CanonicalGrid::new(
        grid.dimensions(),
        grid.coordinates().to_vec(),
        grid.corner_depths().iter().map(|depth| depth + shift).collect(),
        Some(grid.active().to_vec()),
    )
    .unwrap()
}

#[test]
fn test_real_world_grid() {
    let path = require_test_file!("reek.roff");
    let grid = RoffGrid::from_file(&path).unwrap();
    let canonical = grid.to_canonical().unwrap();
    assert_eq!(canonical.active().len(), grid.dimensions().num_cells());
}
