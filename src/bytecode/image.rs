/*!
  A program image is the unit the assembler produces and the interpreter loads:

  ```text
  [instruction count][instruction words...][string pool words...]
  ```

  On disk every word is stored as 4 little-endian bytes.
*/

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::bytecode::Word;
use crate::error::{DecodeError, ImageError};

const WORD_BYTES: usize = 4;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Image {
  /// Encoded instructions, one per word.
  pub code: Vec<Word>,
  /// The packed string pool, see `string_pool`.
  pub static_data: Vec<Word>,
}

impl Image {
  pub fn new(code: Vec<Word>, static_data: Vec<Word>) -> Image {
    Image { code, static_data }
  }

  pub fn instruction_count(&self) -> usize {
    self.code.len()
  }

  /// Number of words the image occupies once loaded, excluding the count word.
  pub fn loaded_len(&self) -> usize {
    self.code.len() + self.static_data.len()
  }

  pub fn to_words(&self) -> Vec<Word> {
    let mut words = Vec::with_capacity(1 + self.loaded_len());
    words.push(self.code.len() as Word);
    words.extend_from_slice(&self.code);
    words.extend_from_slice(&self.static_data);
    words
  }

  pub fn from_words(words: &[Word]) -> Result<Image, ImageError> {
    let (count, rest) = words.split_first().ok_or(ImageError::Empty)?;
    let count = *count as usize;

    if count > rest.len() {
      return Err(DecodeError::TruncatedImage { declared: count, available: rest.len() }.into());
    }

    let (code, static_data) = rest.split_at(count);
    Ok(Image::new(code.to_vec(), static_data.to_vec()))
  }

  pub fn read_from<R: Read>(mut reader: R) -> Result<Image, ImageError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() % WORD_BYTES != 0 {
      return Err(ImageError::Misaligned(bytes.len()));
    }

    let mut words = vec![0 as Word; bytes.len() / WORD_BYTES];
    LittleEndian::read_u32_into(&bytes, &mut words);
    Image::from_words(&words)
  }

  pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ImageError> {
    for word in self.to_words() {
      writer.write_u32::<LittleEndian>(word)?;
    }
    writer.flush()?;
    Ok(())
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Image, ImageError> {
    Image::read_from(BufReader::new(File::open(path)?))
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
    self.write_to(BufWriter::new(File::create(path)?))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn word_layout(){
    let image = Image::new(vec![10, 20], vec![1, 1, 97]);
    assert_eq!(image.to_words(), vec![2, 10, 20, 1, 1, 97]);
    assert_eq!(Image::from_words(&image.to_words()).unwrap(), image);
  }

  #[test]
  fn bytes_are_little_endian(){
    let image = Image::new(vec![0x4000_0000], vec![]);
    let mut bytes = Vec::new();
    image.write_to(&mut bytes).unwrap();
    assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0x40]);
    assert_eq!(Image::read_from(bytes.as_slice()).unwrap(), image);
  }

  #[test]
  fn malformed_images(){
    assert!(matches!(Image::from_words(&[]), Err(ImageError::Empty)));
    assert!(matches!(
      Image::from_words(&[3, 1, 2]),
      Err(ImageError::Decode(DecodeError::TruncatedImage { declared: 3, available: 2 }))
    ));
    assert!(matches!(
      Image::read_from(&[1u8, 0, 0][..]),
      Err(ImageError::Misaligned(3))
    ));
  }
}
