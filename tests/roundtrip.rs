mod common;

use common::{be_u32, chunks, inflate, kinds, unfiltered, GifBuilder};
use gif2png::{decode, encode};

fn convert(gif: &[u8]) -> Vec<u8> {
    let image = decode(gif).unwrap();
    let mut png = vec![];
    encode(&image, &mut png).unwrap();
    png
}

#[test]
fn two_by_two_still_image() {
    let gif = GifBuilder::new(2, 2, Some(&[[255, 0, 0], [0, 255, 0]]))
        .image(2, 2, &[0, 1, 1, 0])
        .finish();

    let image = decode(&gif[..]).unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    assert_eq!(image.frames.len(), 1);
    assert_eq!(image.frames[0].pixels(), &[0, 1, 1, 0]);

    let png = convert(&gif);
    let chunks = chunks(&png);
    assert_eq!(kinds(&chunks), vec!["IHDR", "PLTE", "IDAT", "IEND"]);
    assert_eq!(chunks[0].data, vec![0, 0, 0, 2, 0, 0, 0, 2, 8, 3, 0, 0, 0]);
    assert_eq!(chunks[1].data, vec![255, 0, 0, 0, 255, 0]);
    assert_eq!(inflate(&chunks[2].data), vec![0, 0, 1, 0, 1, 0]);
}

#[test]
fn palette_fidelity() {
    let colors: Vec<[u8; 3]> = (0..16u8).map(|i| [i, i * 16, 255 - i]).collect();
    let pixels: Vec<u8> = (0..16).collect();
    let gif = GifBuilder::new(4, 4, Some(&colors)).image(4, 4, &pixels).finish();

    let chunks = chunks(&convert(&gif));
    let expected: Vec<u8> = colors.iter().flatten().copied().collect();
    assert_eq!(chunks[1].data, expected);
    assert_eq!(inflate(&chunks[2].data), unfiltered(&pixels, 4));
}

#[test]
fn local_palette_is_written() {
    let gif = GifBuilder::new(2, 1, Some(&[[0, 0, 0], [1, 1, 1]]))
        .image_at(0, 0, 2, 1, Some(&[[9, 8, 7], [6, 5, 4]]), false, &[1, 0])
        .finish();
    let chunks = chunks(&convert(&gif));
    assert_eq!(chunks[1].data, vec![9, 8, 7, 6, 5, 4]);
}

#[test]
fn transparent_still_image() {
    let gif = GifBuilder::new(2, 1, Some(&[[0, 0, 0], [1, 1, 1]]))
        .graphic_control(0, Some(1))
        .image(2, 1, &[1, 0])
        .finish();
    let chunks = chunks(&convert(&gif));
    assert_eq!(kinds(&chunks), vec!["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);
    assert_eq!(chunks[2].data, vec![255, 0]);
}

#[test]
fn animated_gif_becomes_apng() {
    let gif = GifBuilder::new(3, 3, Some(&[[0, 0, 0], [255, 255, 255]]))
        .netscape_loop(0)
        .graphic_control(20, None)
        .image(3, 3, &[0; 9])
        .graphic_control(20, Some(0))
        .image_at(1, 1, 2, 2, None, false, &[1; 4])
        .finish();
    let chunks = chunks(&convert(&gif));

    assert_eq!(
        kinds(&chunks),
        vec!["IHDR", "PLTE", "tRNS", "acTL", "fcTL", "IDAT", "fcTL", "fdAT", "IEND"]
    );
    assert_eq!(be_u32(&chunks[0].data[0..4]), 3);
    assert_eq!(be_u32(&chunks[0].data[4..8]), 3);
    assert_eq!(be_u32(&chunks[3].data[0..4]), 2);
    assert_eq!(inflate(&chunks[5].data), unfiltered(&[0; 9], 3));
    assert_eq!(be_u32(&chunks[7].data[..4]), 2);
    assert_eq!(inflate(&chunks[7].data[4..]), unfiltered(&[1; 4], 2));
}

#[test]
fn interlaced_gif_is_written_top_to_bottom() {
    let pixels: Vec<u8> = (0..9).map(|row| row as u8 % 2).collect();
    let gif = GifBuilder::new(1, 9, Some(&[[0, 0, 0], [255, 255, 255]]))
        .image_at(0, 0, 1, 9, None, true, &common::interlace(&pixels, 1))
        .finish();
    let chunks = chunks(&convert(&gif));
    assert_eq!(chunks[0].data[12], 0);
    assert_eq!(inflate(&chunks[2].data), unfiltered(&pixels, 1));
}

#[test]
fn animation_with_small_first_frame() {
    let gif = GifBuilder::new(2, 2, Some(&[[0, 0, 0], [255, 255, 255]]))
        .graphic_control(5, Some(0))
        .image_at(1, 0, 1, 2, None, false, &[1, 1])
        .image(2, 2, &[1, 0, 0, 1])
        .finish();
    let chunks = chunks(&convert(&gif));

    assert_eq!(kinds(&chunks)[..3], ["IHDR", "PLTE", "tRNS"]);
    assert_eq!(chunks[2].data, vec![0, 255]);
    assert_eq!(be_u32(&chunks[4].data[4..8]), 2);
    assert_eq!(be_u32(&chunks[4].data[8..12]), 2);
    assert_eq!(inflate(&chunks[5].data), unfiltered(&[0, 1, 0, 1], 2));
}
