use crate::error::AppendError;
use std::collections::VecDeque;

/// Byte-budgeted ring of opaque records.
///
/// Records are kept oldest first. Appending past `max_size` evicts whole
/// records from the front until the total fits again. The running `size`
/// counter is re-checked against the records before every append, so a
/// desynchronized counter is reported instead of silently trusted.
#[derive(Debug)]
pub struct BoundedRecordBuffer {
    records: VecDeque<Vec<u8>>,
    size: usize,
    max_size: usize,
}

impl BoundedRecordBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    /// Appends `input` as the newest record and evicts from the front until
    /// the ring is back within `max_size`.
    ///
    /// On error the ring is left untouched.
    pub fn append(&mut self, input: Vec<u8>) -> Result<(), AppendError> {
        if input.is_empty() {
            return Err(AppendError::Empty);
        }
        if input.len() > self.max_size {
            return Err(AppendError::ExceededMaxSize {
                len: input.len(),
                max_size: self.max_size,
            });
        }
        let actual = self.records.iter().map(Vec::len).sum::<usize>();
        if actual != self.size {
            return Err(AppendError::Corrupted {
                tracked: self.size,
                actual,
            });
        }
        self.records.try_reserve(1)?;

        self.size += input.len();
        self.records.push_back(input);

        // The newest record fits on its own, so this stops before reaching it.
        while self.size > self.max_size {
            match self.records.pop_front() {
                Some(oldest) => self.size -= oldest.len(),
                None => break,
            }
        }
        Ok(())
    }

    /// Records currently held, oldest first.
    pub fn get_data(&self) -> &VecDeque<Vec<u8>> {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.size = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total bytes held.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[cfg(test)]
    pub(crate) fn desync_size(&mut self, size: usize) {
        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::AppendStatus;

    fn lengths(buffer: &BoundedRecordBuffer) -> Vec<usize> {
        buffer.get_data().iter().map(Vec::len).collect()
    }

    #[test]
    fn evicts_oldest_record_when_over_budget() {
        let mut buffer = BoundedRecordBuffer::new(10);
        buffer.append(vec![1; 4]).unwrap();
        buffer.append(vec![2; 4]).unwrap();
        assert_eq!(buffer.size(), 8);
        assert_eq!(buffer.len(), 2);

        buffer.append(vec![3; 4]).unwrap();
        assert_eq!(buffer.size(), 8);
        let data: Vec<_> = buffer.get_data().iter().cloned().collect();
        assert_eq!(data, vec![vec![2; 4], vec![3; 4]]);
    }

    #[test]
    fn record_filling_whole_budget_evicts_everything_else() {
        let mut buffer = BoundedRecordBuffer::new(5);
        buffer.append(vec![1; 1]).unwrap();
        buffer.append(vec![2; 1]).unwrap();
        buffer.append(vec![3; 2]).unwrap();
        assert_eq!(buffer.size(), 4);

        buffer.append(vec![9; 5]).unwrap();
        assert_eq!(lengths(&buffer), vec![5]);
        assert_eq!(buffer.get_data()[0], vec![9; 5]);
        assert_eq!(buffer.size(), 5);
    }

    #[test]
    fn evicts_several_small_records_for_one_large() {
        let mut buffer = BoundedRecordBuffer::new(8);
        for _ in 0..8 {
            buffer.append(vec![0; 1]).unwrap();
        }
        buffer.append(vec![1; 6]).unwrap();
        assert_eq!(lengths(&buffer), vec![1, 1, 6]);
        assert_eq!(buffer.size(), 8);
    }

    #[test]
    fn rejects_empty_input() {
        let mut buffer = BoundedRecordBuffer::new(10);
        buffer.append(vec![7; 3]).unwrap();

        let err = buffer.append(Vec::new()).unwrap_err();
        assert!(matches!(err, AppendError::Empty));
        assert_eq!(err.status(), AppendStatus::FailIpBufferZero);
        assert_eq!(lengths(&buffer), vec![3]);
        assert_eq!(buffer.size(), 3);
    }

    #[test]
    fn rejects_oversized_input_even_when_empty() {
        let mut buffer = BoundedRecordBuffer::new(4);
        let err = buffer.append(vec![0; 5]).unwrap_err();
        assert_eq!(err.status(), AppendStatus::FailIpBufferExceededMaxsize);
        assert!(buffer.is_empty());
        assert_eq!(buffer.size(), 0);

        buffer.append(vec![1; 2]).unwrap();
        assert!(buffer.append(vec![0; 5]).is_err());
        assert_eq!(lengths(&buffer), vec![2]);
    }

    #[test]
    fn zero_capacity_never_holds_a_record() {
        let mut buffer = BoundedRecordBuffer::new(0);
        let err = buffer.append(vec![1]).unwrap_err();
        assert!(matches!(
            err,
            AppendError::ExceededMaxSize {
                len: 1,
                max_size: 0
            }
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn detects_desynchronized_size_counter() {
        let mut buffer = BoundedRecordBuffer::new(10);
        buffer.append(vec![1; 3]).unwrap();
        buffer.desync_size(7);

        let err = buffer.append(vec![2; 2]).unwrap_err();
        assert!(matches!(
            err,
            AppendError::Corrupted {
                tracked: 7,
                actual: 3
            }
        ));
        assert_eq!(lengths(&buffer), vec![3]);
        assert_eq!(buffer.size(), 7);
    }

    #[test]
    fn empty_input_checked_before_corruption() {
        let mut buffer = BoundedRecordBuffer::new(10);
        buffer.desync_size(1);
        let err = buffer.append(Vec::new()).unwrap_err();
        assert!(matches!(err, AppendError::Empty));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut buffer = BoundedRecordBuffer::new(10);
        buffer.clear();
        assert!(buffer.is_empty());

        buffer.append(vec![1; 4]).unwrap();
        buffer.clear();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.max_size(), 10);

        buffer.append(vec![2; 10]).unwrap();
        assert_eq!(lengths(&buffer), vec![10]);
    }

    #[test]
    fn retained_records_are_a_suffix_within_budget() {
        let mut buffer = BoundedRecordBuffer::new(32);
        let mut appended = Vec::new();
        for i in 0..200usize {
            let record = vec![i as u8; (i * 7) % 13 + 1];
            appended.push(record.clone());
            buffer.append(record).unwrap();

            assert!(buffer.size() <= buffer.max_size());
            let held: Vec<_> = buffer.get_data().iter().cloned().collect();
            assert_eq!(held.as_slice(), &appended[appended.len() - held.len()..]);
            assert_eq!(buffer.size(), held.iter().map(Vec::len).sum::<usize>());
        }
    }
}
